use crate::schema::SchemaError;

/// Errors returned by repository operations.
///
/// Rows hidden by an active rule are never reported as an error: they are
/// simply absent from the result.
#[derive(thiserror::Error, Debug)]
pub enum DalError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("invalid field path '{path}': {reason}")]
    InvalidFieldPath { path: String, reason: String },

    #[error("invalid filter on '{path}': {reason}")]
    InvalidFilter { path: String, reason: String },

    #[error("invalid aggregation '{name}': {reason}")]
    InvalidAggregation { name: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),

    #[error("cannot hydrate '{entity}' row: {reason}")]
    Hydration { entity: String, reason: String },
}

impl DalError {
    pub(crate) fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFieldPath {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_filter(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_aggregation(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAggregation {
            name: name.to_owned(),
            reason: reason.into(),
        }
    }

    pub(crate) fn hydration(entity: &str, reason: impl Into<String>) -> Self {
        Self::Hydration {
            entity: entity.to_owned(),
            reason: reason.into(),
        }
    }
}
