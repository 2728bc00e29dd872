use serde::{Deserialize, Serialize};

use crate::rule_set::{RuleId, RuleSet};

/// Who is issuing the call that carries a [`Context`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    /// Internal/system call (CLI, background jobs, admin API).
    #[default]
    System,
    /// Customer-facing call scoped to a shopper's session.
    UserScoped,
}

/// `Context` carries the visibility-relevant state of a request or operation.
///
/// Built once at request entry (typically from the set of rules a rule-matching
/// engine found active for the current cart/customer) and passed explicitly to
/// every repository call. It is immutable: there are no setters, only the
/// builder.
///
/// Two contexts with equal rule sets and sources compare equal and behave
/// identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Context {
    /// Rules currently in force.
    #[serde(default)]
    active_rules: RuleSet,
    /// Actor kind that issued the call.
    #[serde(default)]
    source: ContextSource,
}

impl Context {
    /// Create a new `Context` builder
    #[must_use]
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// System context without any active rule: nothing is hidden.
    #[must_use]
    pub fn system() -> Self {
        ContextBuilder::default().build()
    }

    /// System context with the given active rules.
    #[must_use]
    pub fn with_rules(rules: impl IntoIterator<Item = RuleId>) -> Self {
        ContextBuilder::default().rules(rules).build()
    }

    /// Rules active for this call.
    #[must_use]
    pub fn active_rules(&self) -> &RuleSet {
        &self.active_rules
    }

    #[must_use]
    pub fn source(&self) -> ContextSource {
        self.source
    }

    #[must_use]
    pub fn is_system_source(&self) -> bool {
        self.source == ContextSource::System
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    active_rules: RuleSet,
    source: ContextSource,
}

impl ContextBuilder {
    #[must_use]
    pub fn rule(mut self, rule: RuleId) -> Self {
        self.active_rules.insert(rule);
        self
    }

    #[must_use]
    pub fn rules(mut self, rules: impl IntoIterator<Item = RuleId>) -> Self {
        self.active_rules.extend(rules);
        self
    }

    #[must_use]
    pub fn source(mut self, source: ContextSource) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn build(self) -> Context {
        Context {
            active_rules: self.active_rules,
            source: self.source,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn rid(s: &str) -> RuleId {
        s.parse().unwrap()
    }

    #[test]
    fn test_context_builder_full() {
        let r1 = rid("550e8400-e29b-41d4-a716-446655440001");
        let r2 = rid("550e8400-e29b-41d4-a716-446655440002");

        let ctx = Context::builder()
            .rule(r1)
            .rules([r2, r1])
            .source(ContextSource::UserScoped)
            .build();

        assert_eq!(ctx.active_rules().len(), 2);
        assert!(ctx.active_rules().contains(&r1));
        assert!(ctx.active_rules().contains(&r2));
        assert!(!ctx.is_system_source());
    }

    #[test]
    fn test_context_system() {
        let ctx = Context::system();

        assert!(ctx.active_rules().is_empty());
        assert!(ctx.is_system_source());
        assert_eq!(ctx.source(), ContextSource::System);
    }

    #[test]
    fn test_context_with_rules_defaults_to_system_source() {
        let ctx = Context::with_rules([RuleId::random()]);

        assert_eq!(ctx.active_rules().len(), 1);
        assert!(ctx.is_system_source());
    }

    #[test]
    fn test_contexts_with_equal_rules_are_equal() {
        let r1 = RuleId::random();
        let r2 = RuleId::random();

        assert_eq!(Context::with_rules([r1, r2]), Context::with_rules([r2, r1]));
        assert_ne!(Context::with_rules([r1]), Context::with_rules([r2]));
    }

    #[test]
    fn test_context_serialize_deserialize() {
        let r1 = rid("550e8400-e29b-41d4-a716-446655440001");
        let original = Context::builder()
            .rule(r1)
            .source(ContextSource::UserScoped)
            .build();

        let serialized = serde_json::to_string(&original).unwrap();
        assert!(serialized.contains("\"user_scoped\""));

        let deserialized: Context = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, original);
    }

    #[test]
    fn test_context_deserialize_defaults() {
        let ctx: Context = serde_json::from_str("{}").unwrap();

        assert_eq!(ctx, Context::system());
    }
}
