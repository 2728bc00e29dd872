use std::sync::Arc;

use rulegate_context::Context;
use rulegate_dal::{
    Aggregation, Criteria, DalConfig, EntityRepository, Filter, Schema, SortDirection,
    StorageExecutor, Value,
};
use tracing::debug;
use uuid::Uuid;

use super::error::ListingError;
use super::model::{ListingRequest, ListingResult};
use crate::config::ListingConfig;
use crate::infra::PRODUCT;

/// Name of the aggregation collecting the property options of all matches.
pub const PROPERTIES_AGGREGATION: &str = "properties";

pub struct ListingService {
    products: EntityRepository,
    config: ListingConfig,
}

impl ListingService {
    /// # Errors
    /// Returns [`ListingError::InvalidQuery`] if `schema` has no product entity.
    pub fn new(
        schema: Arc<Schema>,
        executor: Arc<dyn StorageExecutor>,
        config: ListingConfig,
        dal: DalConfig,
    ) -> Result<Self, ListingError> {
        let products = EntityRepository::new(schema, PRODUCT, executor, dal)?;
        Ok(Self { products, config })
    }

    #[must_use]
    pub fn config(&self) -> &ListingConfig {
        &self.config
    }

    /// One page of listed products visible under `ctx`, with the property
    /// options of every match.
    ///
    /// # Errors
    /// Returns [`ListingError::Validation`] for a page of 0 or a limit of 0,
    /// otherwise whatever reading the catalog fails with.
    #[tracing::instrument(skip_all, fields(page = request.page))]
    pub async fn search(
        &self,
        request: &ListingRequest,
        ctx: &Context,
    ) -> Result<ListingResult, ListingError> {
        let criteria = self.criteria(request)?;
        let result = self.products.search(&criteria, ctx).await?;

        let properties = result
            .aggregations()
            .get(PROPERTIES_AGGREGATION)
            .and_then(|agg| agg.values())
            .unwrap_or_default()
            .iter()
            .filter_map(Value::as_uuid)
            .collect::<Vec<Uuid>>();

        debug!(
            total = result.total(),
            listed = result.len(),
            properties = properties.len(),
            "listing loaded"
        );
        Ok(ListingResult {
            total: result.total(),
            products: result.entities().to_vec(),
            properties,
        })
    }

    fn criteria(&self, request: &ListingRequest) -> Result<Criteria, ListingError> {
        if request.page == 0 {
            return Err(ListingError::validation("page", "pages start at 1"));
        }
        let limit = match request.limit {
            Some(0) => return Err(ListingError::validation("limit", "must be positive")),
            Some(limit) => limit.min(self.config.max_page_size),
            None => self.config.max_page_size,
        };

        // Variants, and main products that have no variants. The stored count
        // is used since a hidden variant still makes its parent a container.
        let mut criteria = Criteria::new()
            .filter(Filter::or(vec![
                Filter::not_equals("parent_id", Value::Null),
                Filter::equals("child_count", 0_i64),
            ]))
            .filter(Filter::equals("active", true))
            .aggregation(Aggregation::value(PROPERTIES_AGGREGATION, "options.id"))
            .association("options")
            .sort("product_number", SortDirection::Asc)
            .limit(limit)
            .offset((request.page - 1).saturating_mul(limit));

        if let Some(category) = request.category {
            criteria = criteria.filter(Filter::or(vec![
                Filter::equals("categories.id", category),
                Filter::equals("parent.categories.id", category),
            ]));
        }
        if let Some(term) = request.search.as_deref().map(str::trim)
            && !term.is_empty()
        {
            criteria = criteria.filter(Filter::contains("name", term));
        }
        if self.config.hide_closeout_products_when_out_of_stock {
            criteria = criteria.filter(Filter::or(vec![
                Filter::equals("is_closeout", false),
                Filter::gt("stock", 0_i64),
            ]));
        }
        Ok(criteria)
    }
}
