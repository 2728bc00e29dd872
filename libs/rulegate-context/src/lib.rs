#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
pub mod context;
pub mod rule_set;

pub use context::{Context, ContextBuilder, ContextSource};
pub use rule_set::{RuleId, RuleIdParseError, RuleSet};
