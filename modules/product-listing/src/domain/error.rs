use rulegate_dal::DalError;

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("Validation error on field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Invalid listing query: {0}")]
    InvalidQuery(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ListingError {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<DalError> for ListingError {
    fn from(e: DalError) -> Self {
        match e {
            DalError::Storage(_) | DalError::Hydration { .. } => {
                tracing::error!(error = %e, "catalog read failed");
                Self::Storage(e.to_string())
            }
            DalError::Schema(_)
            | DalError::InvalidFieldPath { .. }
            | DalError::InvalidFilter { .. }
            | DalError::InvalidAggregation { .. } => Self::InvalidQuery(e.to_string()),
        }
    }
}
