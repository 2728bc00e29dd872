//! Typed join graph for one query.
//!
//! A plan is built fresh for every query by [`PlanBuilder`] in the
//! [`Unguarded`] state. Only the [`VisibilityInjector`](crate::VisibilityInjector)
//! can turn it into a [`Guarded`] plan, and only guarded plans are accepted
//! by the SQL compiler.

mod resolver;

pub use resolver::{PlanBuilder, ResolvedField, resolve_association_path};

use rulegate_context::RuleId;
use uuid::Uuid;

use crate::criteria::SortDirection;
use crate::schema::{FieldKind, SchemaError};
use crate::value::Value;

/// Typestate marker: no visibility predicate has been attached yet.
/// Cannot be compiled in this state.
#[derive(Debug, Clone, Copy)]
pub struct Unguarded;

/// Typestate marker: every blacklisted alias carries its exclusion predicate.
#[derive(Debug, Clone, Copy)]
pub struct Guarded;

/// `alias.column` reference inside a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub alias: String,
    pub column: String,
}

impl ColumnRef {
    pub(crate) fn new(alias: &str, column: &str) -> Self {
        Self {
            alias: alias.to_owned(),
            column: column.to_owned(),
        }
    }
}

/// `LEFT JOIN table AS alias ON alias.column = parent_alias.parent_column`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub parent_alias: String,
    pub parent_column: String,
    pub column: String,
}

/// How the effective blacklist of a row is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlacklistExpr {
    /// The row's own column.
    Own { column: String },
    /// The row's own column, or the parent row's column when the own value
    /// is `NULL`. The parent row is looked up per row.
    Inherited {
        column: String,
        parent_column: String,
        table: String,
        primary_key: String,
    },
}

/// Predicate "effective blacklist does not intersect `rules`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub expr: BlacklistExpr,
    pub rules: Vec<RuleId>,
}

/// One alias of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
    alias: String,
    path: String,
    table: String,
    entity: Option<String>,
    join: Option<JoinSpec>,
    exclusion: Option<Exclusion>,
}

impl PlanNode {
    pub(crate) fn entity(
        alias: String,
        path: &str,
        table: &str,
        entity: &str,
        join: Option<JoinSpec>,
    ) -> Self {
        Self {
            alias,
            path: path.to_owned(),
            table: table.to_owned(),
            entity: Some(entity.to_owned()),
            join,
            exclusion: None,
        }
    }

    pub(crate) fn mapping(alias: String, path: &str, table: &str, join: JoinSpec) -> Self {
        Self {
            alias,
            path: path.to_owned(),
            table: table.to_owned(),
            entity: None,
            join: Some(join),
            exclusion: None,
        }
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Association path relative to the root; empty for the root node.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Entity name; `None` for many-to-many mapping tables.
    #[must_use]
    pub fn entity_name(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    #[must_use]
    pub fn join(&self) -> Option<&JoinSpec> {
        self.join.as_ref()
    }

    #[must_use]
    pub fn exclusion(&self) -> Option<&Exclusion> {
        self.exclusion.as_ref()
    }
}

/// Validated condition on one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    IsNull,
    IsNotNull,
    Equals(Value),
    NotEquals(Value),
    In(Vec<Value>),
    GreaterThan(Value),
    GreaterThanOrEqual(Value),
    LessThan(Value),
    LessThanOrEqual(Value),
    Contains(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanFilter {
    Condition {
        column: ColumnRef,
        kind: FieldKind,
        predicate: Predicate,
    },
    And(Vec<PlanFilter>),
    Or(Vec<PlanFilter>),
    Not(Box<PlanFilter>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSorting {
    pub column: ColumnRef,
    pub direction: SortDirection,
}

/// Join graph plus filters, sortings and paging of one query.
///
/// `nodes[0]` is always the root alias.
#[derive(Debug, Clone)]
pub struct QueryPlan<S = Unguarded> {
    root_entity: String,
    primary_key: String,
    nodes: Vec<PlanNode>,
    filters: Vec<PlanFilter>,
    sortings: Vec<PlanSorting>,
    owner: Option<ColumnRef>,
    limit: Option<u64>,
    offset: Option<u64>,
    _state: S,
}

impl<S> QueryPlan<S> {
    #[must_use]
    pub fn root_entity(&self) -> &str {
        &self.root_entity
    }

    /// Primary key column of the root entity.
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    #[must_use]
    pub fn root(&self) -> &PlanNode {
        &self.nodes[0]
    }

    #[must_use]
    pub fn nodes(&self) -> &[PlanNode] {
        &self.nodes
    }

    #[must_use]
    pub fn node(&self, alias: &str) -> Option<&PlanNode> {
        self.nodes.iter().find(|n| n.alias == alias)
    }

    #[must_use]
    pub fn filters(&self) -> &[PlanFilter] {
        &self.filters
    }

    #[must_use]
    pub fn sortings(&self) -> &[PlanSorting] {
        &self.sortings
    }

    /// Column holding the owner key when the plan loads an association.
    #[must_use]
    pub fn owner_column(&self) -> Option<&ColumnRef> {
        self.owner.as_ref()
    }

    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    #[must_use]
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Root primary key column.
    #[must_use]
    pub fn root_key(&self) -> ColumnRef {
        ColumnRef::new(self.root().alias(), &self.primary_key)
    }
}

impl QueryPlan<Unguarded> {
    /// Attach one optional exclusion per node and move to the guarded state.
    pub(crate) fn guard<F>(self, mut exclusion_for: F) -> Result<QueryPlan<Guarded>, SchemaError>
    where
        F: FnMut(&PlanNode) -> Result<Option<Exclusion>, SchemaError>,
    {
        let mut nodes = self.nodes;
        for node in &mut nodes {
            node.exclusion = exclusion_for(node)?;
        }
        Ok(QueryPlan {
            root_entity: self.root_entity,
            primary_key: self.primary_key,
            nodes,
            filters: self.filters,
            sortings: self.sortings,
            owner: self.owner,
            limit: self.limit,
            offset: self.offset,
            _state: Guarded,
        })
    }
}

impl QueryPlan<Guarded> {
    /// Nodes carrying an exclusion predicate.
    pub fn exclusions(&self) -> impl Iterator<Item = (&PlanNode, &Exclusion)> {
        self.nodes
            .iter()
            .filter_map(|n| n.exclusion.as_ref().map(|e| (n, e)))
    }
}

/// Ids literal used when restricting a plan to primary keys or owner keys.
pub(crate) fn id_list(ids: &[Uuid]) -> Vec<Value> {
    ids.iter().copied().map(Value::Uuid).collect()
}
