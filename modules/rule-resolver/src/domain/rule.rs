//! Rules and their evaluation.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::Cart;
use super::error::RuleError;

/// Comparison operator of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceOperator {
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Neq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
}

impl fmt::Display for PriceOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
        })
    }
}

/// Outcome of one rule evaluation; `messages` explain a mismatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub matched: bool,
    pub messages: Vec<String>,
}

impl RuleMatch {
    #[must_use]
    pub fn new(matched: bool, message: &str) -> Self {
        Self {
            matched,
            messages: if matched {
                Vec::new()
            } else {
                vec![message.to_owned()]
            },
        }
    }
}

/// A condition on the cart.
pub trait Rule: Send + Sync {
    /// # Errors
    /// Returns [`RuleError`] when the rule cannot be evaluated as configured.
    fn evaluate(&self, cart: &Cart) -> Result<RuleMatch, RuleError>;
}

/// Matches when the summed total price of the goods line items compares to
/// `amount` with `operator`. Only `>=` and `<=` are supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsPriceRule {
    pub amount: Decimal,
    pub operator: PriceOperator,
}

impl GoodsPriceRule {
    #[must_use]
    pub fn new(amount: Decimal, operator: PriceOperator) -> Self {
        Self { amount, operator }
    }
}

impl Rule for GoodsPriceRule {
    fn evaluate(&self, cart: &Cart) -> Result<RuleMatch, RuleError> {
        let total = cart.goods_total();
        match self.operator {
            PriceOperator::Gte => Ok(RuleMatch::new(total >= self.amount, "goods price too low")),
            PriceOperator::Lte => Ok(RuleMatch::new(total <= self.amount, "goods price too high")),
            operator => Err(RuleError::UnsupportedOperator {
                operator,
                rule: "GoodsPriceRule",
            }),
        }
    }
}

/// Serializable rule description, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleDefinition {
    GoodsPrice(GoodsPriceRule),
}

impl RuleDefinition {
    #[must_use]
    pub fn into_rule(self) -> Box<dyn Rule> {
        match self {
            Self::GoodsPrice(rule) => Box::new(rule),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::cart::LineItem;

    fn cart(total: i64) -> Cart {
        Cart::default()
            .with_item(LineItem::goods("a", Decimal::new(total, 0)))
            .with_item(LineItem::non_goods("shipping", Decimal::new(1000, 0)))
    }

    #[test]
    fn gte_and_lte_compare_goods_total() {
        let gte = GoodsPriceRule::new(Decimal::new(100, 0), PriceOperator::Gte);
        let lte = GoodsPriceRule::new(Decimal::new(100, 0), PriceOperator::Lte);

        assert!(gte.evaluate(&cart(100)).unwrap().matched);
        assert!(!gte.evaluate(&cart(99)).unwrap().matched);
        assert!(lte.evaluate(&cart(100)).unwrap().matched);
        assert!(!lte.evaluate(&cart(101)).unwrap().matched);
    }

    #[test]
    fn mismatch_carries_reason() {
        let rule = GoodsPriceRule::new(Decimal::new(100, 0), PriceOperator::Gte);
        let result = rule.evaluate(&cart(5)).unwrap();

        assert_eq!(result.messages, vec!["goods price too low".to_owned()]);
    }

    #[test]
    fn other_operators_are_unsupported() {
        for operator in [
            PriceOperator::Eq,
            PriceOperator::Neq,
            PriceOperator::Gt,
            PriceOperator::Lt,
        ] {
            let rule = GoodsPriceRule::new(Decimal::ONE, operator);
            assert_eq!(
                rule.evaluate(&cart(1)),
                Err(RuleError::UnsupportedOperator {
                    operator,
                    rule: "GoodsPriceRule",
                })
            );
        }
    }

    #[test]
    fn definition_round_trips_through_json() {
        let def: RuleDefinition = serde_json::from_str(
            r#"{"type":"goods_price","amount":"49.90","operator":"<="}"#,
        )
        .unwrap();

        let rule = def.into_rule();
        assert!(rule.evaluate(&cart(40)).unwrap().matched);
    }
}
