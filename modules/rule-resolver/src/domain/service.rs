//! Domain service for the rule resolver.

use rulegate_context::{Context, ContextSource, RuleId};
use tracing::{debug, warn};

use super::cart::Cart;
use super::error::RuleError;
use super::rule::Rule;
use crate::config::RuleResolverConfig;

/// Evaluates configured rules and builds request contexts.
pub struct RuleResolver {
    rules: Vec<(RuleId, Box<dyn Rule>)>,
    skip_failing_rules: bool,
}

impl RuleResolver {
    #[must_use]
    pub fn new(skip_failing_rules: bool) -> Self {
        Self {
            rules: Vec::new(),
            skip_failing_rules,
        }
    }

    #[must_use]
    pub fn from_config(config: RuleResolverConfig) -> Self {
        let mut resolver = Self::new(config.skip_failing_rules);
        for entry in config.rules {
            resolver.register(entry.id, entry.rule.into_rule());
        }
        resolver
    }

    pub fn register(&mut self, id: RuleId, rule: Box<dyn Rule>) {
        self.rules.push((id, rule));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Context whose active rules are the ids of all rules matching `cart`.
    ///
    /// # Errors
    /// Returns the first [`RuleError`] unless failing rules are skipped, in
    /// which case the failing rule is logged and treated as not matching.
    #[tracing::instrument(skip_all, fields(rules = self.rules.len()))]
    pub fn resolve(&self, cart: &Cart, source: ContextSource) -> Result<Context, RuleError> {
        let mut builder = Context::builder().source(source);
        for (id, rule) in &self.rules {
            match rule.evaluate(cart) {
                Ok(result) if result.matched => builder = builder.rule(*id),
                Ok(result) => {
                    debug!(rule = %id, reasons = %result.messages.join("; "), "rule not matched");
                }
                Err(e) if self.skip_failing_rules => {
                    warn!(rule = %id, error = %e, "rule evaluation failed, skipping");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(builder.build())
    }
}
