//! Storage layout of the catalog.

use rulegate_dal::{
    Association, EntityDefinition, Field, FieldKind, MappingTable, Schema, SchemaError,
};

pub const PRODUCT: &str = "product";
pub const MANUFACTURER: &str = "product_manufacturer";
pub const CATEGORY: &str = "category";
pub const PROPERTY_OPTION: &str = "property_group_option";
pub const PROPERTY_GROUP: &str = "property_group";

/// Catalog entities as registered with the data access layer.
///
/// Products form a parent/variant tree; a variant whose own blacklist is
/// NULL inherits its parent's. `child_count` is the stored number of
/// variants, regardless of which of them are visible. Categories and property options are linked
/// through the `product_category` and `product_option` mapping tables.
///
/// # Errors
/// Returns [`SchemaError`] if a definition is inconsistent.
pub fn catalog_schema() -> Result<Schema, SchemaError> {
    let product = EntityDefinition::builder(PRODUCT, "product")
        .primary_key("id")
        .field(Field::new("parent_id", FieldKind::Id))
        .field(Field::new("manufacturer_id", FieldKind::Id))
        .field(Field::new("product_number", FieldKind::String))
        .field(Field::new("name", FieldKind::String))
        .field(Field::new("stock", FieldKind::Int))
        .field(Field::new("is_closeout", FieldKind::Bool))
        .field(Field::new("active", FieldKind::Bool))
        .field(Field::new("child_count", FieldKind::Int))
        .field(Field::new("blacklist_ids", FieldKind::RuleIds))
        .parent("parent_id")
        .blacklist("blacklist_ids", true)
        .association(Association::to_one("parent", PRODUCT, "parent_id", "id"))
        .association(Association::to_many("children", PRODUCT, "id", "parent_id"))
        .association(Association::to_one(
            "manufacturer",
            MANUFACTURER,
            "manufacturer_id",
            "id",
        ))
        .association(Association::many_to_many(
            "categories",
            CATEGORY,
            MappingTable::new("product_category", "product_id", "category_id"),
            "id",
            "id",
        ))
        .association(Association::many_to_many(
            "options",
            PROPERTY_OPTION,
            MappingTable::new("product_option", "product_id", "option_id"),
            "id",
            "id",
        ))
        .build()?;

    let manufacturer = EntityDefinition::builder(MANUFACTURER, "product_manufacturer")
        .primary_key("id")
        .field(Field::new("name", FieldKind::String))
        .field(Field::new("blacklist_ids", FieldKind::RuleIds))
        .blacklist("blacklist_ids", false)
        .build()?;

    let category = EntityDefinition::builder(CATEGORY, "category")
        .primary_key("id")
        .field(Field::new("name", FieldKind::String))
        .field(Field::new("blacklist_ids", FieldKind::RuleIds))
        .blacklist("blacklist_ids", false)
        .build()?;

    let option = EntityDefinition::builder(PROPERTY_OPTION, "property_group_option")
        .primary_key("id")
        .field(Field::new("group_id", FieldKind::Id))
        .field(Field::new("name", FieldKind::String))
        .field(Field::new("blacklist_ids", FieldKind::RuleIds))
        .blacklist("blacklist_ids", false)
        .association(Association::to_one("group", PROPERTY_GROUP, "group_id", "id"))
        .build()?;

    let group = EntityDefinition::builder(PROPERTY_GROUP, "property_group")
        .primary_key("id")
        .field(Field::new("name", FieldKind::String))
        .association(Association::to_many(
            "options",
            PROPERTY_OPTION,
            "id",
            "group_id",
        ))
        .build()?;

    Schema::builder()
        .register(product)
        .register(manufacturer)
        .register(category)
        .register(option)
        .register(group)
        .build()
}
