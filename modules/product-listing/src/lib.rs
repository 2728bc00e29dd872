//! Product listing
//!
//! Lists sellable catalog products (variants and products without variants)
//! for a category or search term. Everything goes through a rule-aware
//! [`EntityRepository`](rulegate_dal::EntityRepository), so products, variants
//! and property options hidden by the caller's active rules never show up.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;

pub use config::{ConfigError, ListingConfig};
pub use domain::{ListingError, ListingRequest, ListingResult, ListingService};
pub use infra::catalog_schema;
