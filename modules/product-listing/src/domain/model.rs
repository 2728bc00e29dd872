//! Listing request and result.

use rulegate_dal::Entity;
use uuid::Uuid;

/// One page of a product listing.
///
/// `page` is 1-based. Without a `limit` the configured maximum page size is
/// used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub category: Option<Uuid>,
    pub search: Option<String>,
    pub page: u64,
    pub limit: Option<u64>,
}

impl Default for ListingRequest {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            page: 1,
            limit: None,
        }
    }
}

impl ListingRequest {
    #[must_use]
    pub fn for_category(category: Uuid) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn for_search(term: impl Into<String>) -> Self {
        Self {
            search: Some(term.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn page(mut self, page: u64, limit: u64) -> Self {
        self.page = page;
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone)]
pub struct ListingResult {
    /// Number of listed products across all pages.
    pub total: u64,
    pub products: Vec<Entity>,
    /// Property options carried by any listed product, across all pages.
    pub properties: Vec<Uuid>,
}

impl ListingResult {
    #[must_use]
    pub fn has(&self, id: Uuid) -> bool {
        self.products.iter().any(|p| p.id() == id)
    }

    #[must_use]
    pub fn has_property(&self, option: Uuid) -> bool {
        self.properties.contains(&option)
    }

    #[must_use]
    pub fn ids(&self) -> Vec<Uuid> {
        self.products.iter().map(Entity::id).collect()
    }
}
