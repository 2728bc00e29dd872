use std::collections::BTreeMap;

use tracing::debug;

use super::definition::expect_kind;
use super::{AssociationKind, EntityDefinition, FieldKind, SchemaError};

/// Read-only registry of entity definitions, shared via `Arc` after startup.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entities: BTreeMap<String, EntityDefinition>,
}

impl Schema {
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Look up the definition of `entity`.
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownEntity`] if no definition is registered.
    pub fn definition_for(&self, entity: &str) -> Result<&EntityDefinition, SchemaError> {
        self.entities
            .get(entity)
            .ok_or_else(|| SchemaError::UnknownEntity(entity.to_owned()))
    }

    pub fn definitions(&self) -> impl Iterator<Item = &EntityDefinition> {
        self.entities.values()
    }
}

#[derive(Default)]
pub struct SchemaBuilder {
    definitions: Vec<EntityDefinition>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn register(mut self, definition: EntityDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Cross-check all definitions and freeze the schema.
    ///
    /// # Errors
    /// Returns a [`SchemaError`] for duplicate entities, associations whose
    /// target is unknown, or association keys that are missing or not of kind
    /// `Id`.
    pub fn build(self) -> Result<Schema, SchemaError> {
        let mut entities = BTreeMap::new();
        for def in self.definitions {
            if entities.contains_key(def.name()) {
                return Err(SchemaError::DuplicateEntity(def.name().to_owned()));
            }
            entities.insert(def.name().to_owned(), def);
        }

        for owner in entities.values() {
            for assoc in owner.associations() {
                let invalid = |reason: String| SchemaError::InvalidAssociation {
                    entity: owner.name().to_owned(),
                    association: assoc.name().to_owned(),
                    reason,
                };

                let target = entities
                    .get(assoc.target())
                    .ok_or_else(|| invalid(format!("unknown target '{}'", assoc.target())))?;

                let source_key = owner.field_by_column(assoc.source_column()).ok_or_else(|| {
                    invalid(format!("no column '{}' on owner", assoc.source_column()))
                })?;
                expect_kind(owner.name(), source_key, FieldKind::Id)?;

                let target_key =
                    target
                        .field_by_column(assoc.target_column())
                        .ok_or_else(|| {
                            invalid(format!("no column '{}' on target", assoc.target_column()))
                        })?;
                expect_kind(target.name(), target_key, FieldKind::Id)?;

                if let AssociationKind::ManyToMany(mapping) = assoc.kind()
                    && [&mapping.table, &mapping.source_column, &mapping.target_column]
                        .iter()
                        .any(|s| s.is_empty())
                {
                    return Err(invalid("incomplete mapping table".to_owned()));
                }
            }
        }

        debug!(entities = entities.len(), "schema built");
        Ok(Schema { entities })
    }
}
