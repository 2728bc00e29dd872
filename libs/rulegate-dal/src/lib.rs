#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Rule-aware data access layer.
//!
//! Callers describe what they want with a [`Criteria`], pass it together with
//! a request [`Context`](rulegate_context::Context) to an [`EntityRepository`],
//! and get back entities, ids or aggregations from which every row hidden by
//! an active rule has already been removed.
//!
//! Pipeline per call:
//!
//! 1. [`plan::PlanBuilder`] resolves dotted field paths against the static
//!    [`Schema`] and produces a [`QueryPlan<Unguarded>`](plan::QueryPlan).
//! 2. [`VisibilityInjector`] attaches exclusion predicates and returns a
//!    `QueryPlan<Guarded>`; only guarded plans can be compiled.
//! 3. [`sql::SqlCompiler`] renders sea-query statements for the backend.
//! 4. The [`StorageExecutor`] runs them and the materializer builds results,
//!    re-applying visibility in memory.
//!
//! # Example
//! ```rust,ignore
//! let repo = EntityRepository::new(schema, "product", executor, DalConfig::default())?;
//! let ctx = Context::with_rules([rule_id]);
//! let result = repo
//!     .search(&Criteria::new().filter(Filter::equals("product.ean", "4711")), &ctx)
//!     .await?;
//! ```

pub mod config;
pub mod criteria;
pub mod error;
pub mod executor;
mod materializer;
pub mod plan;
pub mod repository;
pub mod result;
pub mod schema;
pub mod sql;
pub mod value;
pub mod visibility;

pub use config::DalConfig;
pub use criteria::{
    Aggregation, AggregationKind, AssociationRequest, Criteria, Filter, Operator, SortDirection,
    Sorting,
};
pub use error::DalError;
pub use executor::StorageExecutor;
pub use repository::EntityRepository;
pub use result::{
    AggregationResult, AggregationResultCollection, AssociationValue, Bucket, Entity,
    EntitySearchResult, IdSearchResult,
};
pub use schema::{
    Association, AssociationKind, BlacklistField, EntityDefinition, Field, FieldKind,
    MappingTable, Schema, SchemaBuilder, SchemaError,
};
pub use value::Value;
pub use visibility::VisibilityInjector;
