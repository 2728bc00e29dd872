//! Attaches blacklist exclusion predicates to query plans.
//!
//! # Rules
//!
//! | Situation | Predicate |
//! |-----------|-----------|
//! | active rule set is empty | none on any alias |
//! | entity has no blacklist field | none for that alias |
//! | blacklist, not inheritable (or no parent relation) | own column must not intersect the active rules |
//! | inheritable blacklist with parent relation | `COALESCE(own, parent's)` must not intersect the active rules |
//!
//! The root predicate ends up in `WHERE`; every other predicate is rendered
//! into that alias' `LEFT JOIN ... ON` clause so only the joined instance is
//! dropped, never the row that joins it.

use rulegate_context::Context;
use tracing::debug;

use crate::plan::{BlacklistExpr, Exclusion, Guarded, PlanNode, QueryPlan, Unguarded};
use crate::schema::{EntityDefinition, Schema, SchemaError};

/// Turns unguarded plans into guarded ones for a given [`Context`].
#[derive(Debug, Clone, Copy)]
pub struct VisibilityInjector<'s> {
    schema: &'s Schema,
}

impl<'s> VisibilityInjector<'s> {
    #[must_use]
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// Attach exactly one exclusion per blacklisted alias of `plan`.
    ///
    /// Injection is per alias; the order in which aliases are visited has no
    /// effect on the result.
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownEntity`] if a plan node refers to an
    /// entity that is not registered.
    pub fn inject(
        &self,
        plan: QueryPlan<Unguarded>,
        ctx: &Context,
    ) -> Result<QueryPlan<Guarded>, SchemaError> {
        let rules = ctx.active_rules();
        if rules.is_empty() {
            return plan.guard(|_| Ok(None));
        }

        let rules: Vec<_> = rules.iter().copied().collect();
        let guarded = plan.guard(|node| self.exclusion_for(node, &rules))?;
        debug!(
            entity = guarded.root_entity(),
            exclusions = guarded.exclusions().count(),
            rules = rules.len(),
            "visibility injected"
        );
        Ok(guarded)
    }

    fn exclusion_for(
        &self,
        node: &PlanNode,
        rules: &[rulegate_context::RuleId],
    ) -> Result<Option<Exclusion>, SchemaError> {
        let Some(entity) = node.entity_name() else {
            return Ok(None);
        };
        let def = self.schema.definition_for(entity)?;
        Ok(blacklist_expr(def).map(|expr| Exclusion {
            expr,
            rules: rules.to_vec(),
        }))
    }
}

/// Effective blacklist expression of `def`, if it has a blacklist field.
#[must_use]
pub fn blacklist_expr(def: &EntityDefinition) -> Option<BlacklistExpr> {
    let blacklist = def.blacklist_field()?;
    let column = blacklist.column().to_owned();
    match def.parent_field() {
        Some(parent) if blacklist.is_inheritable() => Some(BlacklistExpr::Inherited {
            column,
            parent_column: parent.column().to_owned(),
            table: def.table().to_owned(),
            primary_key: def.primary_key().column().to_owned(),
        }),
        _ => Some(BlacklistExpr::Own { column }),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::plan::PlanBuilder;
    use crate::schema::{Association, Field, FieldKind, MappingTable};
    use rulegate_context::RuleId;
    use tracing_test::traced_test;

    fn schema() -> Schema {
        let product = EntityDefinition::builder("product", "product")
            .primary_key("id")
            .field(Field::new("parent_id", FieldKind::Id))
            .field(Field::new("manufacturer_id", FieldKind::Id))
            .field(Field::new("blacklist_ids", FieldKind::RuleIds))
            .parent("parent_id")
            .blacklist("blacklist_ids", true)
            .association(Association::to_one(
                "manufacturer",
                "product_manufacturer",
                "manufacturer_id",
                "id",
            ))
            .association(Association::many_to_many(
                "categories",
                "category",
                MappingTable::new("product_category", "product_id", "category_id"),
                "id",
                "id",
            ))
            .build()
            .unwrap();
        let manufacturer = EntityDefinition::builder("product_manufacturer", "product_manufacturer")
            .primary_key("id")
            .field(Field::new("name", FieldKind::String))
            .field(Field::new("blacklist_ids", FieldKind::RuleIds))
            .blacklist("blacklist_ids", true)
            .association(Association::to_many(
                "products",
                "product",
                "id",
                "manufacturer_id",
            ))
            .build()
            .unwrap();
        let category = EntityDefinition::builder("category", "category")
            .primary_key("id")
            .field(Field::new("name", FieldKind::String))
            .build()
            .unwrap();
        Schema::builder()
            .register(product)
            .register(manufacturer)
            .register(category)
            .build()
            .unwrap()
    }

    fn plan(schema: &Schema) -> QueryPlan<Unguarded> {
        let mut builder = PlanBuilder::new(schema, "product", 8).unwrap();
        builder.resolve_field("manufacturer.products.id").unwrap();
        builder.resolve_field("categories.name").unwrap();
        builder.build()
    }

    #[test]
    fn empty_rule_set_injects_nothing() {
        let schema = schema();
        let guarded = VisibilityInjector::new(&schema)
            .inject(plan(&schema), &Context::system())
            .unwrap();

        assert_eq!(guarded.exclusions().count(), 0);
    }

    #[test]
    fn every_blacklisted_alias_gets_exactly_one_exclusion() {
        let schema = schema();
        let rule = RuleId::random();
        let guarded = VisibilityInjector::new(&schema)
            .inject(plan(&schema), &Context::with_rules([rule]))
            .unwrap();

        let aliases: Vec<_> = guarded.exclusions().map(|(n, _)| n.alias()).collect();
        assert_eq!(
            aliases,
            vec![
                "product",
                "product.manufacturer",
                "product.manufacturer.products"
            ]
        );
        assert!(guarded.node("product.categories").unwrap().exclusion().is_none());
        assert!(
            guarded
                .node("product.categories#mapping")
                .unwrap()
                .exclusion()
                .is_none()
        );

        for (_, exclusion) in guarded.exclusions() {
            assert_eq!(exclusion.rules, vec![rule]);
        }
    }

    #[test]
    fn inheritance_needs_parent_relation() {
        let schema = schema();
        let guarded = VisibilityInjector::new(&schema)
            .inject(plan(&schema), &Context::with_rules([RuleId::random()]))
            .unwrap();

        let root = guarded.root().exclusion().unwrap();
        assert_eq!(
            root.expr,
            BlacklistExpr::Inherited {
                column: "blacklist_ids".to_owned(),
                parent_column: "parent_id".to_owned(),
                table: "product".to_owned(),
                primary_key: "id".to_owned(),
            }
        );

        // inheritable flag without a parent field falls back to the own column
        let manufacturer = guarded
            .node("product.manufacturer")
            .unwrap()
            .exclusion()
            .unwrap();
        assert_eq!(
            manufacturer.expr,
            BlacklistExpr::Own {
                column: "blacklist_ids".to_owned()
            }
        );
    }

    #[test]
    #[traced_test]
    fn injection_is_logged() {
        let schema = schema();
        VisibilityInjector::new(&schema)
            .inject(plan(&schema), &Context::with_rules([RuleId::random()]))
            .unwrap();

        assert!(logs_contain("visibility injected"));
    }
}
