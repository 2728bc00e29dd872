#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationKind {
    /// Distinct values of the field.
    Value,
    /// Distinct values with the root ids carrying each of them.
    Terms,
    /// Number of distinct values.
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregationKind {
    /// Kinds that only make sense on numeric fields.
    #[must_use]
    pub fn is_metric(self) -> bool {
        matches!(self, Self::Sum | Self::Avg | Self::Min | Self::Max)
    }
}

/// Named aggregation over a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub name: String,
    pub path: String,
    pub kind: AggregationKind,
}

impl Aggregation {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>, kind: AggregationKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind,
        }
    }

    #[must_use]
    pub fn value(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, AggregationKind::Value)
    }

    #[must_use]
    pub fn terms(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, AggregationKind::Terms)
    }

    #[must_use]
    pub fn count(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, AggregationKind::Count)
    }

    #[must_use]
    pub fn sum(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, AggregationKind::Sum)
    }

    #[must_use]
    pub fn avg(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, AggregationKind::Avg)
    }

    #[must_use]
    pub fn min(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, AggregationKind::Min)
    }

    #[must_use]
    pub fn max(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, path, AggregationKind::Max)
    }
}
