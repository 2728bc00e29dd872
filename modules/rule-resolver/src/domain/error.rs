//! Domain errors for the rule resolver.

use crate::domain::rule::PriceOperator;

/// Rule evaluation errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error("operator '{operator}' is not supported by {rule}")]
    UnsupportedOperator {
        operator: PriceOperator,
        rule: &'static str,
    },
}
