//! Static entity and field definitions.
//!
//! Definitions are registered once at startup through [`SchemaBuilder`],
//! validated, and then only read.

mod definition;
mod field;
mod registry;

pub use definition::{
    Association, AssociationKind, BlacklistField, EntityDefinition, EntityDefinitionBuilder,
    MappingTable,
};
pub use field::{Field, FieldKind};
pub use registry::{Schema, SchemaBuilder};

/// Schema definition and lookup errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unknown entity '{0}'")]
    UnknownEntity(String),

    #[error("entity '{0}' is registered twice")]
    DuplicateEntity(String),

    #[error("unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    #[error("field '{field}' is declared twice on entity '{entity}'")]
    DuplicateField { entity: String, field: String },

    #[error("entity '{entity}' designates more than one blacklist field ('{field}')")]
    DuplicateBlacklistField { entity: String, field: String },

    #[error("field '{field}' on entity '{entity}' must be of kind {expected}, found {actual}")]
    FieldKindMismatch {
        entity: String,
        field: String,
        expected: FieldKind,
        actual: FieldKind,
    },

    #[error("invalid association '{association}' on entity '{entity}': {reason}")]
    InvalidAssociation {
        entity: String,
        association: String,
        reason: String,
    },

    #[error("entity '{entity}' has no primary key")]
    MissingPrimaryKey { entity: String },
}
