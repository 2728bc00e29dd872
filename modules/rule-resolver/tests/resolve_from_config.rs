#![allow(clippy::unwrap_used, clippy::expect_used)]

use rule_resolver::{Cart, LineItem, RuleResolver, RuleResolverConfig};
use rulegate_context::{ContextSource, RuleId};
use rust_decimal::Decimal;

const FREE_SHIPPING: &str = "0b3f2c1e-9a4d-4c6b-8e2f-1a2b3c4d5e6f";
const SMALL_ORDER: &str = "5d8e7f6a-1b2c-4d3e-9f8a-7b6c5d4e3f2a";

fn config() -> RuleResolverConfig {
    serde_json::from_value(serde_json::json!({
        "rules": [
            {
                "id": FREE_SHIPPING,
                "rule": { "type": "goods_price", "amount": "100", "operator": ">=" }
            },
            {
                "id": SMALL_ORDER,
                "rule": { "type": "goods_price", "amount": "20", "operator": "<=" }
            }
        ]
    }))
    .unwrap()
}

#[test]
fn configured_rules_drive_the_context() {
    let resolver = RuleResolver::from_config(config());
    assert_eq!(resolver.len(), 2);

    let big = Cart::default()
        .with_item(LineItem::goods("tent", Decimal::new(8999, 2)))
        .with_item(LineItem::goods("lamp", Decimal::new(1500, 2)))
        .with_item(LineItem::non_goods("discount", Decimal::new(-2000, 2)));

    let ctx = resolver.resolve(&big, ContextSource::UserScoped).unwrap();
    let free_shipping: RuleId = FREE_SHIPPING.parse().unwrap();
    let small_order: RuleId = SMALL_ORDER.parse().unwrap();

    assert!(ctx.active_rules().contains(&free_shipping));
    assert!(!ctx.active_rules().contains(&small_order));
}

#[test]
fn empty_cart_matches_upper_bounds_only() {
    let resolver = RuleResolver::from_config(config());

    let ctx = resolver
        .resolve(&Cart::default(), ContextSource::UserScoped)
        .unwrap();

    assert_eq!(ctx.active_rules().len(), 1);
    assert!(
        ctx.active_rules()
            .contains(&SMALL_ORDER.parse::<RuleId>().unwrap())
    );
}
