#![allow(clippy::unwrap_used, clippy::expect_used)]

use rulegate_context::{Context, ContextSource, RuleId, RuleSet};

#[test]
fn empty_context_restricts_nothing() {
    let ctx = Context::system();
    let blacklist = [RuleId::random()];

    assert!(ctx.active_rules().is_empty());
    assert!(!ctx.active_rules().intersects(&blacklist));
}

#[test]
fn single_shared_rule_is_enough() {
    let r1 = RuleId::random();
    let r2 = RuleId::random();
    let r3 = RuleId::random();

    let ctx = Context::builder()
        .rules([r2, r3])
        .source(ContextSource::UserScoped)
        .build();

    assert!(ctx.active_rules().intersects(&[r1, r2]));
    assert!(!ctx.active_rules().intersects(&[r1]));
}

#[test]
fn rule_set_collects_from_parsed_ids() {
    let set: RuleSet = [
        "11111111-1111-1111-1111-111111111111",
        "11111111111111111111111111111111",
        "22222222-2222-2222-2222-222222222222",
    ]
    .iter()
    .map(|s| s.parse::<RuleId>().unwrap())
    .collect();

    assert_eq!(set.len(), 2);
}
