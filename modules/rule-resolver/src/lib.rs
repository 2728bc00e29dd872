//! Rule resolver
//!
//! Evaluates the configured rules against a cart and turns the ids of the
//! matching rules into the [`Context`](rulegate_context::Context) that data
//! access uses for visibility.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{RuleEntry, RuleResolverConfig};
pub use domain::{
    Cart, GoodsPriceRule, LineItem, PriceOperator, Rule, RuleDefinition, RuleError, RuleMatch,
    RuleResolver,
};
