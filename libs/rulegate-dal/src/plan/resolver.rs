use tracing::debug;
use uuid::Uuid;

use super::{
    ColumnRef, JoinSpec, PlanFilter, PlanNode, PlanSorting, Predicate, QueryPlan, Unguarded,
    id_list,
};
use crate::criteria::{Aggregation, Criteria, Filter, Operator, Sorting};
use crate::error::DalError;
use crate::schema::{Association, AssociationKind, EntityDefinition, Field, FieldKind, Schema};
use crate::value::Value;

/// A field path resolved to an alias of the plan.
#[derive(Debug, Clone)]
pub struct ResolvedField<'s> {
    pub column: ColumnRef,
    pub field: &'s Field,
    pub entity: &'s EntityDefinition,
    /// At least one segment of the path is a to-many association.
    pub to_many: bool,
}

/// Builds a [`QueryPlan<Unguarded>`] for one root entity.
///
/// Every distinct association path prefix gets exactly one alias; resolving
/// `manufacturer.name` and `manufacturer.id` joins `manufacturer` once.
/// Aliases are derived from the path (`product.manufacturer`), many-to-many
/// mapping tables get a `#mapping` suffix.
pub struct PlanBuilder<'s> {
    schema: &'s Schema,
    root: &'s EntityDefinition,
    max_depth: usize,
    nodes: Vec<PlanNode>,
    filters: Vec<PlanFilter>,
    sortings: Vec<PlanSorting>,
    owner: Option<ColumnRef>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl<'s> PlanBuilder<'s> {
    /// Start a plan rooted at `entity`.
    ///
    /// # Errors
    /// Returns [`DalError::Schema`] if `entity` is not registered.
    pub fn new(schema: &'s Schema, entity: &str, max_depth: usize) -> Result<Self, DalError> {
        let root = schema.definition_for(entity)?;
        Ok(Self {
            schema,
            root,
            max_depth,
            nodes: vec![PlanNode::entity(
                root.name().to_owned(),
                "",
                root.table(),
                root.name(),
                None,
            )],
            filters: Vec::new(),
            sortings: Vec::new(),
            owner: None,
            limit: None,
            offset: None,
        })
    }

    /// Apply ids, filters, sortings and paging of `criteria`.
    ///
    /// Aggregations and association requests are planned separately.
    ///
    /// # Errors
    /// Returns [`DalError::InvalidFieldPath`] or [`DalError::InvalidFilter`]
    /// for paths or filters that do not fit the schema.
    pub fn apply(&mut self, criteria: &Criteria) -> Result<(), DalError> {
        self.apply_filters(criteria)?;
        for sorting in &criteria.sortings {
            self.sort(sorting)?;
        }
        self.limit = criteria.limit;
        self.offset = criteria.offset;
        Ok(())
    }

    /// Apply only ids and filters of `criteria`.
    ///
    /// # Errors
    /// See [`PlanBuilder::apply`].
    pub fn apply_filters(&mut self, criteria: &Criteria) -> Result<(), DalError> {
        self.restrict_to_ids(&criteria.ids);
        for filter in &criteria.filters {
            self.filter(filter)?;
        }
        Ok(())
    }

    /// Restrict the root to the given primary keys. No-op for an empty slice.
    pub fn restrict_to_ids(&mut self, ids: &[Uuid]) {
        if ids.is_empty() {
            return;
        }
        self.filters.push(PlanFilter::Condition {
            column: ColumnRef::new(self.root.name(), self.root.primary_key().column()),
            kind: FieldKind::Id,
            predicate: Predicate::In(id_list(ids)),
        });
    }

    /// Restrict the root (the association target) to rows linked to one of
    /// `owners` through `association`, and expose the owner key.
    pub fn restrict_to_owners(&mut self, association: &Association, owners: &[Uuid]) {
        let root_alias = self.root.name().to_owned();
        let owner = match association.kind() {
            AssociationKind::ManyToMany(mapping) => {
                let alias = format!("{root_alias}#owner");
                self.nodes.push(PlanNode::mapping(
                    alias.clone(),
                    "#owner",
                    &mapping.table,
                    JoinSpec {
                        parent_alias: root_alias,
                        parent_column: association.target_column().to_owned(),
                        column: mapping.target_column.clone(),
                    },
                ));
                ColumnRef::new(&alias, &mapping.source_column)
            }
            AssociationKind::ToOne | AssociationKind::ToMany => {
                ColumnRef::new(&root_alias, association.target_column())
            }
        };
        self.filters.push(PlanFilter::Condition {
            column: owner.clone(),
            kind: FieldKind::Id,
            predicate: Predicate::In(id_list(owners)),
        });
        self.owner = Some(owner);
    }

    /// Resolve and add a filter.
    ///
    /// # Errors
    /// Returns [`DalError::InvalidFieldPath`] for unknown paths and
    /// [`DalError::InvalidFilter`] for operator or value mismatches, filters
    /// on rule id lists and empty `Or` / `EqualsAny`.
    pub fn filter(&mut self, filter: &Filter) -> Result<(), DalError> {
        let resolved = self.resolve_filter(filter)?;
        self.filters.push(resolved);
        Ok(())
    }

    /// Resolve and add a sorting.
    ///
    /// # Errors
    /// Returns [`DalError::InvalidFieldPath`] for unknown or unsortable paths.
    pub fn sort(&mut self, sorting: &Sorting) -> Result<(), DalError> {
        let resolved = self.resolve_field(&sorting.path)?;
        if resolved.field.kind() == FieldKind::RuleIds {
            return Err(DalError::invalid_path(
                &sorting.path,
                "rule id lists are not sortable",
            ));
        }
        self.sortings.push(PlanSorting {
            column: resolved.column,
            direction: sorting.direction,
        });
        Ok(())
    }

    /// Resolve the field an aggregation runs over and check that its kind
    /// fits the aggregation.
    ///
    /// # Errors
    /// Returns [`DalError::InvalidFieldPath`] for unknown paths and
    /// [`DalError::InvalidAggregation`] for kind mismatches.
    pub fn aggregation(&mut self, aggregation: &Aggregation) -> Result<ResolvedField<'s>, DalError> {
        let resolved = self.resolve_field(&aggregation.path)?;
        let kind = resolved.field.kind();
        if kind == FieldKind::RuleIds {
            return Err(DalError::invalid_aggregation(
                &aggregation.name,
                "rule id lists cannot be aggregated",
            ));
        }
        if aggregation.kind.is_metric() && !kind.is_numeric() {
            return Err(DalError::invalid_aggregation(
                &aggregation.name,
                format!("'{}' is a {kind} field, not numeric", aggregation.path),
            ));
        }
        Ok(resolved)
    }

    /// Resolve a dotted field path, joining every association segment.
    ///
    /// # Errors
    /// Returns [`DalError::InvalidFieldPath`] if a segment is unknown, an
    /// intermediate segment is not an association, the last segment is not
    /// a field, or the path is too deep.
    pub fn resolve_field(&mut self, path: &str) -> Result<ResolvedField<'s>, DalError> {
        let schema = self.schema;
        let segments = split_path(self.root, path, self.max_depth)?;
        let Some((last, associations)) = segments.split_last() else {
            return Err(DalError::invalid_path(path, "empty path"));
        };

        let mut def = self.root;
        let mut alias = self.root.name().to_owned();
        let mut prefix = String::new();
        let mut to_many = false;

        for segment in associations {
            let association = association_of(def, path, segment)?;
            let target = schema.definition_for(association.target())?;
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            alias = self.join(&alias, &prefix, association, target);
            to_many |= association.is_to_many();
            def = target;
        }

        let field = def.field(last).ok_or_else(|| {
            if def.association(last).is_some() {
                DalError::invalid_path(path, format!("'{last}' is an association, not a field"))
            } else {
                DalError::invalid_path(path, format!("unknown field '{last}' on '{}'", def.name()))
            }
        })?;

        Ok(ResolvedField {
            column: ColumnRef::new(&alias, field.column()),
            field,
            entity: def,
            to_many,
        })
    }

    #[must_use]
    pub fn build(self) -> QueryPlan<Unguarded> {
        debug!(
            entity = self.root.name(),
            aliases = self.nodes.len(),
            filters = self.filters.len(),
            "query plan built"
        );
        QueryPlan {
            root_entity: self.root.name().to_owned(),
            primary_key: self.root.primary_key().column().to_owned(),
            nodes: self.nodes,
            filters: self.filters,
            sortings: self.sortings,
            owner: self.owner,
            limit: self.limit,
            offset: self.offset,
            _state: Unguarded,
        }
    }

    fn join(
        &mut self,
        parent_alias: &str,
        path: &str,
        association: &Association,
        target: &EntityDefinition,
    ) -> String {
        let alias = format!("{}.{path}", self.root.name());
        if self.nodes.iter().any(|n| n.alias() == alias) {
            return alias;
        }

        let (parent_alias, parent_column) = match association.kind() {
            AssociationKind::ManyToMany(mapping) => {
                let mapping_alias = format!("{alias}#mapping");
                self.nodes.push(PlanNode::mapping(
                    mapping_alias.clone(),
                    path,
                    &mapping.table,
                    JoinSpec {
                        parent_alias: parent_alias.to_owned(),
                        parent_column: association.source_column().to_owned(),
                        column: mapping.source_column.clone(),
                    },
                ));
                (mapping_alias, mapping.target_column.clone())
            }
            AssociationKind::ToOne | AssociationKind::ToMany => (
                parent_alias.to_owned(),
                association.source_column().to_owned(),
            ),
        };

        self.nodes.push(PlanNode::entity(
            alias.clone(),
            path,
            target.table(),
            target.name(),
            Some(JoinSpec {
                parent_alias,
                parent_column,
                column: association.target_column().to_owned(),
            }),
        ));
        alias
    }

    fn resolve_filter(&mut self, filter: &Filter) -> Result<PlanFilter, DalError> {
        match filter {
            Filter::Condition {
                path,
                operator,
                value,
            } => {
                let resolved = self.resolve_field(path)?;
                let kind = resolved.field.kind();
                if kind == FieldKind::RuleIds {
                    return Err(DalError::invalid_filter(
                        path,
                        "rule id lists cannot be filtered",
                    ));
                }
                Ok(PlanFilter::Condition {
                    column: resolved.column,
                    kind,
                    predicate: predicate(path, kind, *operator, value)?,
                })
            }
            Filter::And(children) => children
                .iter()
                .map(|child| self.resolve_filter(child))
                .collect::<Result<Vec<_>, _>>()
                .map(PlanFilter::And),
            Filter::Or(children) => {
                if children.is_empty() {
                    return Err(DalError::invalid_filter("", "OR needs at least one filter"));
                }
                children
                    .iter()
                    .map(|child| self.resolve_filter(child))
                    .collect::<Result<Vec<_>, _>>()
                    .map(PlanFilter::Or)
            }
            Filter::Not(inner) => Ok(PlanFilter::Not(Box::new(self.resolve_filter(inner)?))),
        }
    }
}

/// Resolve an association request path (every segment an association).
///
/// Returns the association names with the optional root prefix removed.
///
/// # Errors
/// Returns [`DalError::InvalidFieldPath`] if a segment is not an
/// association or the path is too deep.
pub fn resolve_association_path(
    schema: &Schema,
    root: &EntityDefinition,
    path: &str,
    max_depth: usize,
) -> Result<Vec<String>, DalError> {
    let segments = split_path(root, path, max_depth)?;
    let mut def = root;
    for segment in &segments {
        let association = association_of(def, path, segment)?;
        def = schema.definition_for(association.target())?;
    }
    Ok(segments.into_iter().map(str::to_owned).collect())
}

fn split_path<'p>(
    root: &EntityDefinition,
    path: &'p str,
    max_depth: usize,
) -> Result<Vec<&'p str>, DalError> {
    let mut segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(DalError::invalid_path(path, "empty segment"));
    }
    let prefixed = segments.len() > 1
        && segments[0] == root.name()
        && root.field(segments[0]).is_none()
        && root.association(segments[0]).is_none();
    if prefixed {
        segments.remove(0);
    }
    if segments.len() > max_depth {
        return Err(DalError::invalid_path(
            path,
            format!("more than {max_depth} segments"),
        ));
    }
    Ok(segments)
}

fn association_of<'d>(
    def: &'d EntityDefinition,
    path: &str,
    segment: &str,
) -> Result<&'d Association, DalError> {
    def.association(segment).ok_or_else(|| {
        if def.field(segment).is_some() {
            DalError::invalid_path(path, format!("'{segment}' is a field, not an association"))
        } else {
            DalError::invalid_path(
                path,
                format!("unknown association '{segment}' on '{}'", def.name()),
            )
        }
    })
}

fn predicate(
    path: &str,
    kind: FieldKind,
    operator: Operator,
    value: &Value,
) -> Result<Predicate, DalError> {
    let scalar = |v: &Value| operand(path, kind, v);
    let ordered = |v: &Value| {
        if kind.is_ordered() {
            operand(path, kind, v)
        } else {
            Err(DalError::invalid_filter(
                path,
                format!("range operators do not apply to {kind} fields"),
            ))
        }
    };

    Ok(match operator {
        Operator::Equals if value.is_null() => Predicate::IsNull,
        Operator::NotEquals if value.is_null() => Predicate::IsNotNull,
        Operator::Equals => Predicate::Equals(scalar(value)?),
        Operator::NotEquals => Predicate::NotEquals(scalar(value)?),
        Operator::EqualsAny => {
            let items = value
                .as_list()
                .ok_or_else(|| DalError::invalid_filter(path, "EqualsAny expects a list"))?;
            if items.is_empty() {
                return Err(DalError::invalid_filter(
                    path,
                    "EqualsAny needs at least one value",
                ));
            }
            Predicate::In(items.iter().map(scalar).collect::<Result<_, _>>()?)
        }
        Operator::GreaterThan => Predicate::GreaterThan(ordered(value)?),
        Operator::GreaterThanOrEqual => Predicate::GreaterThanOrEqual(ordered(value)?),
        Operator::LessThan => Predicate::LessThan(ordered(value)?),
        Operator::LessThanOrEqual => Predicate::LessThanOrEqual(ordered(value)?),
        Operator::Contains => match (kind, value) {
            (FieldKind::String, Value::String(needle)) => Predicate::Contains(needle.clone()),
            _ => {
                return Err(DalError::invalid_filter(
                    path,
                    "Contains needs a string field and a string value",
                ));
            }
        },
    })
}

/// Check a scalar operand against the field kind, normalizing string ids
/// and integer values for float fields.
fn operand(path: &str, kind: FieldKind, value: &Value) -> Result<Value, DalError> {
    match (kind, value) {
        (FieldKind::Id, Value::String(raw)) => Uuid::parse_str(raw)
            .map(Value::Uuid)
            .map_err(|_| DalError::invalid_filter(path, format!("'{raw}' is not a valid id"))),
        (FieldKind::Id, Value::Uuid(_))
        | (FieldKind::String, Value::String(_))
        | (FieldKind::Int, Value::Int(_))
        | (FieldKind::Float, Value::Float(_))
        | (FieldKind::Bool, Value::Bool(_)) => Ok(value.clone()),
        (FieldKind::Float, Value::Int(_)) => value
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| DalError::invalid_filter(path, "not a number")),
        _ => Err(DalError::invalid_filter(
            path,
            format!("value '{value}' does not fit a {kind} field"),
        )),
    }
}
