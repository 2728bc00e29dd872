//! The cart rules are evaluated against.

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub key: String,
    pub total_price: Decimal,
    /// Physical or digital goods, as opposed to discounts, vouchers or fees.
    pub good: bool,
}

impl LineItem {
    #[must_use]
    pub fn goods(key: impl Into<String>, total_price: Decimal) -> Self {
        Self {
            key: key.into(),
            total_price,
            good: true,
        }
    }

    #[must_use]
    pub fn non_goods(key: impl Into<String>, total_price: Decimal) -> Self {
        Self {
            key: key.into(),
            total_price,
            good: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    line_items: Vec<LineItem>,
}

impl Cart {
    #[must_use]
    pub fn new(line_items: Vec<LineItem>) -> Self {
        Self { line_items }
    }

    #[must_use]
    pub fn with_item(mut self, item: LineItem) -> Self {
        self.line_items.push(item);
        self
    }

    #[must_use]
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn goods(&self) -> impl Iterator<Item = &LineItem> {
        self.line_items.iter().filter(|item| item.good)
    }

    /// Sum of the total prices of all goods line items.
    #[must_use]
    pub fn goods_total(&self) -> Decimal {
        self.goods().map(|item| item.total_price).sum()
    }
}
