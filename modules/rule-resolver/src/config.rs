//! Configuration for the rule resolver.

use rulegate_context::RuleId;
use serde::Deserialize;

use crate::domain::RuleDefinition;

/// Configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleResolverConfig {
    /// Rules evaluated on every resolve, in order.
    pub rules: Vec<RuleEntry>,

    /// Leave a rule out of the context when its evaluation fails instead of
    /// failing the whole resolve.
    pub skip_failing_rules: bool,
}

impl Default for RuleResolverConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            skip_failing_rules: true,
        }
    }
}

/// One configured rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleEntry {
    pub id: RuleId,
    pub rule: RuleDefinition,
}
