use super::{Field, FieldKind, SchemaError};

/// Join table of a many-to-many association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    /// Mapping table name.
    pub table: String,
    /// Column referencing the owner side.
    pub source_column: String,
    /// Column referencing the target side.
    pub target_column: String,
}

impl MappingTable {
    #[must_use]
    pub fn new(
        table: impl Into<String>,
        source_column: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            source_column: source_column.into(),
            target_column: target_column.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationKind {
    ToOne,
    ToMany,
    ManyToMany(MappingTable),
}

/// Named relation from one entity to another.
///
/// Rows are linked by `owner.source_column = target.target_column`; for
/// many-to-many associations both sides are linked through the mapping table
/// instead (`owner.source_column = mapping.source_column` and
/// `mapping.target_column = target.target_column`).
///
/// | kind | `source_column` (owner) | `target_column` (target) |
/// |------|-------------------------|--------------------------|
/// | to-one | foreign key | primary key |
/// | to-many | primary key | foreign key |
/// | many-to-many | primary key | primary key |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    name: String,
    target: String,
    kind: AssociationKind,
    source_column: String,
    target_column: String,
}

impl Association {
    #[must_use]
    pub fn to_one(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign_key: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind: AssociationKind::ToOne,
            source_column: foreign_key.into(),
            target_column: target_key.into(),
        }
    }

    #[must_use]
    pub fn to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        local_key: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind: AssociationKind::ToMany,
            source_column: local_key.into(),
            target_column: foreign_key.into(),
        }
    }

    #[must_use]
    pub fn many_to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        mapping: MappingTable,
        local_key: impl Into<String>,
        target_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind: AssociationKind::ManyToMany(mapping),
            source_column: local_key.into(),
            target_column: target_key.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn kind(&self) -> &AssociationKind {
        &self.kind
    }

    #[must_use]
    pub fn source_column(&self) -> &str {
        &self.source_column
    }

    #[must_use]
    pub fn target_column(&self) -> &str {
        &self.target_column
    }

    /// To-many and many-to-many associations fan out rows.
    #[must_use]
    pub fn is_to_many(&self) -> bool {
        !matches!(self.kind, AssociationKind::ToOne)
    }
}

/// The field holding an entity's blacklist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistField {
    field: Field,
    inheritable: bool,
}

impl BlacklistField {
    #[must_use]
    pub fn field(&self) -> &Field {
        &self.field
    }

    #[must_use]
    pub fn column(&self) -> &str {
        self.field.column()
    }

    /// A row without an own value falls back to its parent's value.
    #[must_use]
    pub fn is_inheritable(&self) -> bool {
        self.inheritable
    }
}

/// Static description of one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDefinition {
    name: String,
    table: String,
    fields: Vec<Field>,
    primary_key: usize,
    associations: Vec<Association>,
    parent: Option<usize>,
    blacklist: Option<BlacklistField>,
}

impl EntityDefinition {
    #[must_use]
    pub fn builder(name: impl Into<String>, table: impl Into<String>) -> EntityDefinitionBuilder {
        EntityDefinitionBuilder {
            name: name.into(),
            table: table.into(),
            fields: Vec::new(),
            primary_key: None,
            associations: Vec::new(),
            parent: None,
            blacklist: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    #[must_use]
    pub fn field_by_column(&self, column: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.column() == column)
    }

    #[must_use]
    pub fn primary_key(&self) -> &Field {
        &self.fields[self.primary_key]
    }

    #[must_use]
    pub fn associations(&self) -> &[Association] {
        &self.associations
    }

    #[must_use]
    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations.iter().find(|a| a.name() == name)
    }

    /// Self-reference used for blacklist inheritance.
    #[must_use]
    pub fn parent_field(&self) -> Option<&Field> {
        self.parent.map(|idx| &self.fields[idx])
    }

    #[must_use]
    pub fn blacklist_field(&self) -> Option<&BlacklistField> {
        self.blacklist.as_ref()
    }

    /// Whether rows may inherit the blacklist of their parent row.
    #[must_use]
    pub fn inherits_blacklist(&self) -> bool {
        self.parent.is_some() && self.blacklist.as_ref().is_some_and(|b| b.inheritable)
    }
}

pub struct EntityDefinitionBuilder {
    name: String,
    table: String,
    fields: Vec<Field>,
    primary_key: Option<String>,
    associations: Vec<Association>,
    parent: Option<String>,
    blacklist: Vec<(String, bool)>,
}

impl EntityDefinitionBuilder {
    #[must_use]
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Add an `Id` field and mark it as primary key.
    #[must_use]
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.fields.push(Field::new(name.clone(), FieldKind::Id));
        self.primary_key = Some(name);
        self
    }

    #[must_use]
    pub fn association(mut self, association: Association) -> Self {
        self.associations.push(association);
        self
    }

    /// Declare `field` as the self-reference to the parent row.
    #[must_use]
    pub fn parent(mut self, field: impl Into<String>) -> Self {
        self.parent = Some(field.into());
        self
    }

    /// Designate `field` as the blacklist field. Designating twice is an error.
    #[must_use]
    pub fn blacklist(mut self, field: impl Into<String>, inheritable: bool) -> Self {
        self.blacklist.push((field.into(), inheritable));
        self
    }

    /// Validate and freeze the definition.
    ///
    /// # Errors
    /// Returns a [`SchemaError`] for duplicate fields or associations, a
    /// missing primary key, a parent field that is not an `Id`, or a
    /// blacklist field that is unknown, not of kind `RuleIds` or designated
    /// more than once.
    pub fn build(self) -> Result<EntityDefinition, SchemaError> {
        let entity = self.name;

        for (i, field) in self.fields.iter().enumerate() {
            if self.fields[..i].iter().any(|f| f.name() == field.name()) {
                return Err(SchemaError::DuplicateField {
                    entity,
                    field: field.name().to_owned(),
                });
            }
        }
        for (i, assoc) in self.associations.iter().enumerate() {
            let clashes_with_field = self.fields.iter().any(|f| f.name() == assoc.name());
            let clashes_with_assoc = self.associations[..i]
                .iter()
                .any(|a| a.name() == assoc.name());
            if clashes_with_field || clashes_with_assoc {
                return Err(SchemaError::DuplicateField {
                    entity,
                    field: assoc.name().to_owned(),
                });
            }
        }

        let position = |name: &str| self.fields.iter().position(|f| f.name() == name);

        let primary_key = match self.primary_key.as_deref() {
            Some(pk) => position(pk).ok_or_else(|| SchemaError::UnknownField {
                entity: entity.clone(),
                field: pk.to_owned(),
            })?,
            None => return Err(SchemaError::MissingPrimaryKey { entity }),
        };

        let parent = match self.parent.as_deref() {
            Some(name) => {
                let idx = position(name).ok_or_else(|| SchemaError::UnknownField {
                    entity: entity.clone(),
                    field: name.to_owned(),
                })?;
                expect_kind(&entity, &self.fields[idx], FieldKind::Id)?;
                Some(idx)
            }
            None => None,
        };

        if let [_, extra, ..] = self.blacklist.as_slice() {
            return Err(SchemaError::DuplicateBlacklistField {
                entity,
                field: extra.0.clone(),
            });
        }
        let blacklist = match self.blacklist.into_iter().next() {
            Some((name, inheritable)) => {
                let idx = position(&name).ok_or_else(|| SchemaError::UnknownField {
                    entity: entity.clone(),
                    field: name.clone(),
                })?;
                expect_kind(&entity, &self.fields[idx], FieldKind::RuleIds)?;
                Some(BlacklistField {
                    field: self.fields[idx].clone(),
                    inheritable,
                })
            }
            None => None,
        };

        Ok(EntityDefinition {
            name: entity,
            table: self.table,
            fields: self.fields,
            primary_key,
            associations: self.associations,
            parent,
            blacklist,
        })
    }
}

pub(super) fn expect_kind(
    entity: &str,
    field: &Field,
    expected: FieldKind,
) -> Result<(), SchemaError> {
    if field.kind() == expected {
        Ok(())
    } else {
        Err(SchemaError::FieldKindMismatch {
            entity: entity.to_owned(),
            field: field.name().to_owned(),
            expected,
            actual: field.kind(),
        })
    }
}
