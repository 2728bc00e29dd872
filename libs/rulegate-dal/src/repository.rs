//! Rule-aware read access to one entity.

use std::collections::BTreeSet;
use std::sync::Arc;

use rulegate_context::Context;
use tracing::debug;
use uuid::Uuid;

use crate::config::DalConfig;
use crate::criteria::Criteria;
use crate::error::DalError;
use crate::executor::StorageExecutor;
use crate::materializer::{AggregationPlan, AssociationTree, Materializer};
use crate::plan::{ColumnRef, Guarded, PlanBuilder, QueryPlan, resolve_association_path};
use crate::result::{AggregationResultCollection, EntitySearchResult, IdSearchResult};
use crate::schema::{EntityDefinition, Schema};
use crate::visibility::VisibilityInjector;

/// Searches one root entity with visibility applied from the given
/// [`Context`].
///
/// Everything that can be validated is validated before the first statement
/// is sent: an invalid path, filter or aggregation never reaches storage.
#[derive(Clone)]
pub struct EntityRepository {
    schema: Arc<Schema>,
    entity: String,
    executor: Arc<dyn StorageExecutor>,
    config: DalConfig,
}

impl EntityRepository {
    /// # Errors
    /// Returns [`DalError::Schema`] if `entity` is not registered in `schema`.
    pub fn new(
        schema: Arc<Schema>,
        entity: impl Into<String>,
        executor: Arc<dyn StorageExecutor>,
        config: DalConfig,
    ) -> Result<Self, DalError> {
        let entity = entity.into();
        schema.definition_for(&entity)?;
        Ok(Self {
            schema,
            entity,
            executor,
            config,
        })
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Full entities matching `criteria`, with requested associations and
    /// aggregations.
    ///
    /// # Errors
    /// Returns a validation error ([`DalError::InvalidFieldPath`],
    /// [`DalError::InvalidFilter`], [`DalError::InvalidAggregation`]) before
    /// touching storage, or [`DalError::Storage`] / [`DalError::Hydration`]
    /// if reading fails.
    #[tracing::instrument(skip_all, fields(entity = %self.entity))]
    pub async fn search(
        &self,
        criteria: &Criteria,
        ctx: &Context,
    ) -> Result<EntitySearchResult, DalError> {
        let def = self.definition()?;
        let plan = self.id_plan(criteria, ctx)?;
        let aggregations = self.aggregation_plans(criteria, ctx)?;
        let tree = self.association_tree(def, criteria)?;

        let materializer = self.materializer();
        let ids = materializer.ids(&plan).await?;
        let total = total(&materializer, criteria, &plan, &ids).await?;

        let mut entities = materializer.load_entities(def, &ids, ctx).await?;
        if !tree.is_empty() {
            materializer
                .load_associations(def, &mut entities, &tree, ctx)
                .await?;
        }
        let aggregations = materializer.aggregate_all(&aggregations).await?;

        debug!(found = entities.len(), total, "search finished");
        Ok(EntitySearchResult::new(total, entities, aggregations))
    }

    /// Ids matching `criteria`. Aggregations and associations are ignored.
    ///
    /// # Errors
    /// See [`EntityRepository::search`].
    #[tracing::instrument(skip_all, fields(entity = %self.entity))]
    pub async fn search_ids(
        &self,
        criteria: &Criteria,
        ctx: &Context,
    ) -> Result<IdSearchResult, DalError> {
        let plan = self.id_plan(criteria, ctx)?;
        let materializer = self.materializer();
        let ids = materializer.ids(&plan).await?;
        let total = total(&materializer, criteria, &plan, &ids).await?;

        debug!(found = ids.len(), total, "id search finished");
        Ok(IdSearchResult::new(total, ids))
    }

    /// Aggregations of `criteria` over all visible matches. Limit, offset
    /// and sortings do not apply.
    ///
    /// # Errors
    /// See [`EntityRepository::search`].
    #[tracing::instrument(skip_all, fields(entity = %self.entity))]
    pub async fn aggregate(
        &self,
        criteria: &Criteria,
        ctx: &Context,
    ) -> Result<AggregationResultCollection, DalError> {
        let aggregations = self.aggregation_plans(criteria, ctx)?;
        let results = self.materializer().aggregate_all(&aggregations).await?;
        debug!(aggregations = results.len(), "aggregation finished");
        Ok(results)
    }

    fn definition(&self) -> Result<&EntityDefinition, DalError> {
        Ok(self.schema.definition_for(&self.entity)?)
    }

    fn materializer(&self) -> Materializer<'_> {
        Materializer::new(&self.schema, self.executor.as_ref(), &self.config)
    }

    fn builder(&self) -> Result<PlanBuilder<'_>, DalError> {
        PlanBuilder::new(&self.schema, &self.entity, self.config.max_path_depth)
    }

    fn id_plan(&self, criteria: &Criteria, ctx: &Context) -> Result<QueryPlan<Guarded>, DalError> {
        let mut builder = self.builder()?;
        builder.apply(criteria)?;
        Ok(VisibilityInjector::new(&self.schema).inject(builder.build(), ctx)?)
    }

    fn aggregation_plans(
        &self,
        criteria: &Criteria,
        ctx: &Context,
    ) -> Result<Vec<AggregationPlan>, DalError> {
        let mut names = BTreeSet::new();
        let mut plans = Vec::with_capacity(criteria.aggregations.len());
        for aggregation in &criteria.aggregations {
            if !names.insert(aggregation.name.as_str()) {
                return Err(DalError::invalid_aggregation(
                    &aggregation.name,
                    "name is used more than once",
                ));
            }
            let mut builder = self.builder()?;
            builder.apply_filters(criteria)?;
            let resolved = builder.aggregation(aggregation)?;
            let value_kind = resolved.field.kind();
            let row_key =
                ColumnRef::new(&resolved.column.alias, resolved.entity.primary_key().column());
            let column = resolved.column;
            let plan = VisibilityInjector::new(&self.schema).inject(builder.build(), ctx)?;
            plans.push(AggregationPlan {
                name: aggregation.name.clone(),
                kind: aggregation.kind,
                value_kind,
                column,
                row_key,
                plan,
            });
        }
        Ok(plans)
    }

    fn association_tree(
        &self,
        def: &EntityDefinition,
        criteria: &Criteria,
    ) -> Result<AssociationTree, DalError> {
        let mut tree = AssociationTree::default();
        for request in &criteria.associations {
            let segments = resolve_association_path(
                &self.schema,
                def,
                &request.path,
                self.config.max_path_depth,
            )?;
            tree.insert(&segments, request.limit);
        }
        Ok(tree)
    }
}

/// Visible matches ignoring the window; only paginated criteria need a
/// separate count.
async fn total(
    materializer: &Materializer<'_>,
    criteria: &Criteria,
    plan: &QueryPlan<Guarded>,
    ids: &[Uuid],
) -> Result<u64, DalError> {
    if criteria.is_paginated() {
        materializer.count(plan).await
    } else {
        Ok(u64::try_from(ids.len()).unwrap_or(u64::MAX))
    }
}
