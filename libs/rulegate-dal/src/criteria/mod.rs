//! What a caller asks a repository for.

mod aggregation;
mod filter;

pub use aggregation::{Aggregation, AggregationKind};
pub use filter::{Filter, Operator};

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sorting {
    pub path: String,
    pub direction: SortDirection,
}

/// Request to load a (possibly nested) association with the results.
///
/// `limit` applies per owner and to the last segment of `path` only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationRequest {
    pub path: String,
    pub limit: Option<u64>,
}

/// Search criteria for one root entity.
///
/// All top-level filters are AND-ed. Paths may be written with or without
/// the root entity name as prefix (`product.ean` and `ean` are equivalent
/// on a `product` repository).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub ids: Vec<Uuid>,
    pub filters: Vec<Filter>,
    pub aggregations: Vec<Aggregation>,
    pub associations: Vec<AssociationRequest>,
    pub sortings: Vec<Sorting>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Criteria {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria restricted to the given primary keys.
    #[must_use]
    pub fn with_ids(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregations.push(aggregation);
        self
    }

    #[must_use]
    pub fn association(mut self, path: impl Into<String>) -> Self {
        self.associations.push(AssociationRequest {
            path: path.into(),
            limit: None,
        });
        self
    }

    #[must_use]
    pub fn association_with_limit(mut self, path: impl Into<String>, limit: u64) -> Self {
        self.associations.push(AssociationRequest {
            path: path.into(),
            limit: Some(limit),
        });
        self
    }

    #[must_use]
    pub fn sort(mut self, path: impl Into<String>, direction: SortDirection) -> Self {
        self.sortings.push(Sorting {
            path: path.into(),
            direction,
        });
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Whether only a window of the matching ids is requested.
    #[must_use]
    pub fn is_paginated(&self) -> bool {
        self.limit.is_some() || self.offset.is_some()
    }
}
