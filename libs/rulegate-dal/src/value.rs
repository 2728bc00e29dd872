//! Dynamically typed field values used in filters, results and aggregations.

use std::fmt;

use uuid::Uuid;

/// A single field value.
///
/// Identifiers are carried as [`Uuid`]s and stored as canonical hyphenated
/// lowercase text.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Uuid(Uuid),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(id) => Some(*id),
            Self::String(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of the value; integers are widened.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Bind parameter for a scalar value. Lists have no scalar form.
    pub(crate) fn to_sea_value(&self) -> Option<sea_orm::Value> {
        match self {
            Self::Null => Some(sea_orm::Value::String(None)),
            Self::Bool(b) => Some(sea_orm::Value::from(*b)),
            Self::Int(n) => Some(sea_orm::Value::from(*n)),
            Self::Float(f) => Some(sea_orm::Value::from(*f)),
            Self::String(s) => Some(sea_orm::Value::from(s.clone())),
            Self::Uuid(id) => Some(sea_orm::Value::from(id.hyphenated().to_string())),
            Self::List(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::String(s) => f.write_str(s),
            Self::Uuid(id) => write!(f, "{}", id.hyphenated()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn uuid_binds_as_hyphenated_text() {
        let id = Uuid::parse_str("0190a3b4-0000-7000-8000-000000000001").unwrap();
        let bound = Value::Uuid(id).to_sea_value().unwrap();

        assert_eq!(
            bound,
            sea_orm::Value::from("0190a3b4-0000-7000-8000-000000000001".to_owned())
        );
    }

    #[test]
    fn list_has_no_scalar_binding() {
        let list = Value::from(vec![1_i64, 2]);
        assert!(list.to_sea_value().is_none());
        assert_eq!(list.to_string(), "[1, 2]");
    }

    #[test]
    fn option_converts_to_null() {
        assert!(Value::from(None::<i64>).is_null());
        assert_eq!(Value::from(Some("x")), Value::String("x".to_owned()));
    }

    #[test]
    fn string_uuid_is_readable_as_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(Value::String(id.to_string()).as_uuid(), Some(id));
        assert_eq!(Value::from("nope").as_uuid(), None);
    }
}
