//! Runs compiled statements and turns rows into results.
//!
//! Entity rows go through an in-memory visibility check on top of the SQL
//! exclusion, so a row whose effective blacklist intersects the active rules
//! is never handed out even if the SQL predicate was bypassed.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use futures::FutureExt;
use futures::future::BoxFuture;
use rulegate_context::{Context, RuleId};
use sea_orm::QueryResult;
use sea_orm::sea_query::SelectStatement;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::DalConfig;
use crate::criteria::AggregationKind;
use crate::error::DalError;
use crate::executor::StorageExecutor;
use crate::plan::{ColumnRef, Guarded, PlanBuilder, QueryPlan};
use crate::result::{
    AggregationResult, AggregationResultCollection, AssociationValue, Bucket, Entity,
};
use crate::schema::{EntityDefinition, FieldKind, Schema};
use crate::sql::{
    BLACKLIST_COLUMN, Dialect, ID_COLUMN, OWNER_COLUMN, SqlCompiler, TOTAL_COLUMN, VALUE_COLUMN,
    normalize_rule,
};
use crate::value::Value;
use crate::visibility::VisibilityInjector;

/// Requested associations, keyed by association name per level.
#[derive(Debug, Default)]
pub struct AssociationTree {
    children: BTreeMap<String, AssociationNode>,
}

#[derive(Debug, Default)]
struct AssociationNode {
    limit: Option<u64>,
    tree: AssociationTree,
}

impl AssociationTree {
    /// Add a resolved association path. The limit belongs to the last segment.
    pub fn insert(&mut self, segments: &[String], limit: Option<u64>) {
        let Some((first, rest)) = segments.split_first() else {
            return;
        };
        let node = self.children.entry(first.clone()).or_default();
        if rest.is_empty() {
            if limit.is_some() {
                node.limit = limit;
            }
        } else {
            node.tree.insert(rest, limit);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// A planned aggregation over one column.
///
/// `row_key` is the primary key of the alias holding `column`; rows are
/// distinct per `(root id, row_key)`.
pub struct AggregationPlan {
    pub name: String,
    pub kind: AggregationKind,
    pub value_kind: FieldKind,
    pub column: ColumnRef,
    pub row_key: ColumnRef,
    pub plan: QueryPlan<Guarded>,
}

pub struct Materializer<'a> {
    schema: &'a Schema,
    executor: &'a dyn StorageExecutor,
    config: &'a DalConfig,
    compiler: SqlCompiler,
}

impl<'a> Materializer<'a> {
    pub fn new(
        schema: &'a Schema,
        executor: &'a dyn StorageExecutor,
        config: &'a DalConfig,
    ) -> Self {
        Self {
            schema,
            executor,
            config,
            compiler: SqlCompiler::new(Dialect::from(executor.backend())),
        }
    }

    async fn fetch(&self, stmt: &SelectStatement) -> Result<Vec<QueryResult>, DalError> {
        let statement = self.executor.backend().build(stmt);
        if self.config.log_statements {
            debug!(sql = %statement.sql, "executing statement");
        }
        Ok(self.executor.fetch_all(statement).await?)
    }

    /// Root ids of the plan, in result order.
    pub async fn ids(&self, plan: &QueryPlan<Guarded>) -> Result<Vec<Uuid>, DalError> {
        let rows = self.fetch(&self.compiler.id_query(plan)).await?;
        rows.iter()
            .map(|row| read_id(plan.root_entity(), row, ID_COLUMN))
            .collect()
    }

    /// Number of matching roots ignoring limit and offset.
    pub async fn count(&self, plan: &QueryPlan<Guarded>) -> Result<u64, DalError> {
        let rows = self.fetch(&self.compiler.count_query(plan)).await?;
        let total: i64 = match rows.first() {
            Some(row) => row.try_get("", TOTAL_COLUMN)?,
            None => 0,
        };
        u64::try_from(total)
            .map_err(|_| DalError::hydration(plan.root_entity(), "negative row count"))
    }

    /// Load full rows of `def` for `ids`, keeping the order of `ids`.
    pub async fn load_entities(
        &self,
        def: &EntityDefinition,
        ids: &[Uuid],
        ctx: &Context,
    ) -> Result<Vec<Entity>, DalError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = PlanBuilder::new(self.schema, def.name(), self.config.max_path_depth)?;
        builder.restrict_to_ids(ids);
        let plan = VisibilityInjector::new(self.schema).inject(builder.build(), ctx)?;

        let rows = self.fetch(&self.compiler.entity_query(&plan, def)).await?;
        let mut by_id: HashMap<Uuid, Entity> = hydrate(def, &rows, ctx, false)?
            .into_iter()
            .map(|(entity, _)| (entity.id(), entity))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    /// Load every association of `tree` into `owners`, recursing into
    /// nested requests. Hidden related rows are dropped before the per-owner
    /// limit is applied.
    pub fn load_associations<'b>(
        &'b self,
        def: &'b EntityDefinition,
        owners: &'b mut [Entity],
        tree: &'b AssociationTree,
        ctx: &'b Context,
    ) -> BoxFuture<'b, Result<(), DalError>> {
        async move {
            for (name, node) in &tree.children {
                let association = def.association(name).ok_or_else(|| {
                    DalError::invalid_path(name, format!("unknown association on '{}'", def.name()))
                })?;
                let target = self.schema.definition_for(association.target())?;
                let owner_field = def
                    .field_by_column(association.source_column())
                    .ok_or_else(|| {
                        DalError::invalid_path(name, "association key is not a field")
                    })?
                    .name();

                let keys: Vec<Uuid> = owners
                    .iter()
                    .filter_map(|e| e.get(owner_field).and_then(Value::as_uuid))
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();

                let mut related = Vec::new();
                if !keys.is_empty() {
                    let mut builder =
                        PlanBuilder::new(self.schema, target.name(), self.config.max_path_depth)?;
                    builder.restrict_to_owners(association, &keys);
                    let plan = VisibilityInjector::new(self.schema).inject(builder.build(), ctx)?;
                    let rows = self.fetch(&self.compiler.entity_query(&plan, target)).await?;
                    related = hydrate(target, &rows, ctx, true)?;
                }

                if !node.tree.is_empty() && !related.is_empty() {
                    let (mut entities, owner_keys): (Vec<Entity>, Vec<Option<Uuid>>) =
                        related.into_iter().unzip();
                    self.load_associations(target, &mut entities, &node.tree, ctx)
                        .await?;
                    related = entities.into_iter().zip(owner_keys).collect();
                }

                let limit = if association.is_to_many() {
                    Some(self.config.association_limit(node.limit))
                } else {
                    None
                };
                attach(owners, name, owner_field, related, limit);
            }
            Ok(())
        }
        .boxed()
    }

    pub async fn aggregate_all(
        &self,
        aggregations: &[AggregationPlan],
    ) -> Result<AggregationResultCollection, DalError> {
        let mut results = AggregationResultCollection::default();
        for aggregation in aggregations {
            results.insert(&aggregation.name, self.aggregate(aggregation).await?);
        }
        Ok(results)
    }

    async fn aggregate(&self, aggregation: &AggregationPlan) -> Result<AggregationResult, DalError> {
        let plan = &aggregation.plan;
        let rows = self
            .fetch(
                &self
                    .compiler
                    .value_query(plan, &aggregation.column, &aggregation.row_key),
            )
            .await?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in &rows {
            let value = read_value(plan.root_entity(), row, VALUE_COLUMN, aggregation.value_kind)?;
            if value.is_null() {
                continue;
            }
            pairs.push((read_id(plan.root_entity(), row, ID_COLUMN)?, value));
        }
        Ok(fold(aggregation.kind, pairs))
    }
}

fn hydrate(
    def: &EntityDefinition,
    rows: &[QueryResult],
    ctx: &Context,
    with_owner: bool,
) -> Result<Vec<(Entity, Option<Uuid>)>, DalError> {
    let rules = ctx.active_rules();
    let guarded = !rules.is_empty() && def.blacklist_field().is_some();
    let mut out = Vec::with_capacity(rows.len());

    for row in rows {
        if guarded {
            let blacklist = read_blacklist(def.name(), row)?;
            if rules.intersects(&blacklist) {
                trace!(entity = def.name(), "row hidden by active rule");
                continue;
            }
        }

        let mut fields = BTreeMap::new();
        for field in def.fields() {
            let value = read_value(def.name(), row, field.name(), field.kind())?;
            fields.insert(field.name().to_owned(), value);
        }
        let id = fields
            .get(def.primary_key().name())
            .and_then(Value::as_uuid)
            .ok_or_else(|| DalError::hydration(def.name(), "primary key is NULL"))?;
        let owner = if with_owner {
            Some(read_id(def.name(), row, OWNER_COLUMN)?)
        } else {
            None
        };
        out.push((Entity::new(def.name(), id, fields), owner));
    }
    Ok(out)
}

/// Distribute loaded rows over their owners. `limit` is set for to-many
/// associations only.
fn attach(
    owners: &mut [Entity],
    name: &str,
    owner_field: &str,
    related: Vec<(Entity, Option<Uuid>)>,
    limit: Option<u64>,
) {
    let mut grouped: HashMap<Uuid, Vec<Entity>> = HashMap::new();
    for (entity, owner) in related {
        if let Some(owner) = owner {
            grouped.entry(owner).or_default().push(entity);
        }
    }

    for owner in owners.iter_mut() {
        let rows = owner
            .get(owner_field)
            .and_then(Value::as_uuid)
            .and_then(|key| grouped.get(&key))
            .cloned()
            .unwrap_or_default();
        let value = match limit {
            Some(limit) => {
                let limit = usize::try_from(limit).unwrap_or(usize::MAX);
                AssociationValue::Many(rows.into_iter().take(limit).collect())
            }
            None => AssociationValue::One(rows.into_iter().next().map(Box::new)),
        };
        owner.set_association(name, value);
    }
}

fn read_id(entity: &str, row: &QueryResult, column: &str) -> Result<Uuid, DalError> {
    let raw: Option<String> = row.try_get("", column)?;
    let raw = raw.ok_or_else(|| DalError::hydration(entity, format!("'{column}' is NULL")))?;
    Uuid::parse_str(&raw)
        .map_err(|e| DalError::hydration(entity, format!("'{column}' is not an id: {e}")))
}

/// Blacklist entries read the way the SQL exclusion reads them: normalized,
/// with entries that are no rule id ignored since no active rule can match them.
fn read_blacklist(entity: &str, row: &QueryResult) -> Result<Vec<RuleId>, DalError> {
    let raw: Option<String> = row.try_get("", BLACKLIST_COLUMN)?;
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let entries: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .map_err(|e| DalError::hydration(entity, format!("malformed blacklist: {e}")))?;
    Ok(entries
        .iter()
        .filter_map(serde_json::Value::as_str)
        .filter_map(|entry| {
            let normalized = normalize_rule(entry);
            (normalized.len() == 32)
                .then(|| Uuid::try_parse(&normalized).ok())
                .flatten()
                .map(RuleId::new)
        })
        .collect())
}

fn read_value(
    entity: &str,
    row: &QueryResult,
    column: &str,
    kind: FieldKind,
) -> Result<Value, DalError> {
    let value = match kind {
        FieldKind::Id => match row.try_get::<Option<String>>("", column)? {
            Some(raw) => Value::Uuid(Uuid::parse_str(&raw).map_err(|e| {
                DalError::hydration(entity, format!("'{column}' is not an id: {e}"))
            })?),
            None => Value::Null,
        },
        FieldKind::String => row.try_get::<Option<String>>("", column)?.into(),
        FieldKind::Int => row.try_get::<Option<i64>>("", column)?.into(),
        FieldKind::Float => row.try_get::<Option<f64>>("", column)?.into(),
        FieldKind::Bool => row.try_get::<Option<bool>>("", column)?.into(),
        FieldKind::RuleIds => match row.try_get::<Option<String>>("", column)? {
            Some(raw) => {
                let ids: Vec<Uuid> = serde_json::from_str(&raw).map_err(|e| {
                    DalError::hydration(entity, format!("'{column}' is not an id list: {e}"))
                })?;
                Value::List(ids.into_iter().map(Value::Uuid).collect())
            }
            None => Value::Null,
        },
    };
    Ok(value)
}

/// Fold `(root id, value)` rows sorted by value into an aggregation result.
///
/// There is one row per distinct aggregated row and root, so metrics count
/// equal values of different rows separately.
#[allow(clippy::cast_precision_loss)]
fn fold(kind: AggregationKind, pairs: Vec<(Uuid, Value)>) -> AggregationResult {
    match kind {
        AggregationKind::Value => AggregationResult::Value(distinct(pairs)),
        AggregationKind::Count => {
            AggregationResult::Count(u64::try_from(distinct(pairs).len()).unwrap_or(u64::MAX))
        }
        AggregationKind::Terms => {
            let mut buckets: Vec<Bucket> = Vec::new();
            for (id, value) in pairs {
                match buckets.last_mut() {
                    Some(bucket) if bucket.key == value => {
                        if !bucket.ids.contains(&id) {
                            bucket.ids.push(id);
                        }
                    }
                    _ => buckets.push(Bucket {
                        key: value,
                        ids: vec![id],
                    }),
                }
            }
            AggregationResult::Terms(buckets)
        }
        AggregationKind::Sum | AggregationKind::Avg | AggregationKind::Min | AggregationKind::Max => {
            let numbers: Vec<f64> = pairs.iter().filter_map(|(_, v)| v.as_f64()).collect();
            if numbers.is_empty() {
                return AggregationResult::Metric(None);
            }
            let sum: f64 = numbers.iter().sum();
            let metric = match kind {
                AggregationKind::Avg => sum / numbers.len() as f64,
                AggregationKind::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
                AggregationKind::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                _ => sum,
            };
            AggregationResult::Metric(Some(metric))
        }
    }
}

fn distinct(pairs: Vec<(Uuid, Value)>) -> Vec<Value> {
    let mut values: Vec<Value> = Vec::new();
    for (_, value) in pairs {
        if !values.contains(&value) {
            values.push(value);
        }
    }
    values
}
