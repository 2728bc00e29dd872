//! Domain layer for the rule resolver.

pub mod cart;
pub mod error;
pub mod rule;
pub mod service;

pub use cart::{Cart, LineItem};
pub use error::RuleError;
pub use rule::{GoodsPriceRule, PriceOperator, Rule, RuleDefinition, RuleMatch};
pub use service::RuleResolver;
