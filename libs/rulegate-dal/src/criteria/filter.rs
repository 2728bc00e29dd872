use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    /// Value must be a non-empty [`Value::List`].
    EqualsAny,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    /// Substring match on string fields.
    Contains,
}

impl Operator {
    #[must_use]
    pub fn is_range(self) -> bool {
        matches!(
            self,
            Self::GreaterThan | Self::GreaterThanOrEqual | Self::LessThan | Self::LessThanOrEqual
        )
    }
}

/// A filter over dotted field paths such as `manufacturer.name` or
/// `categories.products.ean`.
///
/// Conditions on to-many paths match a root row when at least one visible
/// associated row matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Condition {
        path: String,
        operator: Operator,
        value: Value,
    },
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    #[must_use]
    pub fn condition(path: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::Condition {
            path: path.into(),
            operator,
            value: value.into(),
        }
    }

    /// `path = value`; `Value::Null` means `IS NULL`.
    #[must_use]
    pub fn equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(path, Operator::Equals, value)
    }

    /// `path <> value`; `Value::Null` means `IS NOT NULL`.
    #[must_use]
    pub fn not_equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(path, Operator::NotEquals, value)
    }

    #[must_use]
    pub fn equals_any<V: Into<Value>>(
        path: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::Condition {
            path: path.into(),
            operator: Operator::EqualsAny,
            value: Value::List(values.into_iter().map(Into::into).collect()),
        }
    }

    #[must_use]
    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(path, Operator::GreaterThan, value)
    }

    #[must_use]
    pub fn gte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(path, Operator::GreaterThanOrEqual, value)
    }

    #[must_use]
    pub fn lt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(path, Operator::LessThan, value)
    }

    #[must_use]
    pub fn lte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::condition(path, Operator::LessThanOrEqual, value)
    }

    #[must_use]
    pub fn contains(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::condition(path, Operator::Contains, Value::String(value.into()))
    }

    #[must_use]
    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And(filters)
    }

    #[must_use]
    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or(filters)
    }

    #[must_use]
    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// All field paths referenced by this filter, depth first.
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Condition { path, .. } => out.push(path),
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.collect_paths(out);
                }
            }
            Self::Not(inner) => inner.collect_paths(out),
        }
    }
}
