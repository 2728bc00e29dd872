use std::fmt;

/// Storage kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// UUID stored as canonical hyphenated text.
    Id,
    String,
    Int,
    Float,
    Bool,
    /// JSON array of rule identifiers (blacklist storage).
    RuleIds,
}

impl FieldKind {
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }

    /// Whether `<`, `<=`, `>`, `>=` are meaningful for this kind.
    #[must_use]
    pub fn is_ordered(self) -> bool {
        matches!(self, Self::Int | Self::Float | Self::String)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Id => "id",
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::RuleIds => "rule id list",
        })
    }
}

/// A field of an entity: `name` is what criteria paths refer to, `column`
/// is the storage column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    column: String,
    kind: FieldKind,
}

impl Field {
    /// Field whose column has the same name.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            column: name.clone(),
            name,
            kind,
        }
    }

    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}
