#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

//! In-memory SQLite catalog shared by the integration tests.
//!
//! ```text
//! acme (visible)                globex (blacklist [rule])
//!   plain      A-1  stock 5       globex_product  B-1  stock 3
//!   blocked    A-2  stock 0  [rule]
//!     inheriting_variant  A-2.1  stock 1  (NULL -> inherits [rule])
//!     overriding_variant  A-2.2  stock 2  ([] -> visible)
//!
//! shoes:  plain, globex_product
//! hidden: plain                 (blacklist [rule])
//! ```

use std::sync::Arc;

use rulegate_context::RuleId;
use rulegate_dal::{
    Association, DalConfig, EntityDefinition, EntityRepository, Field, FieldKind, MappingTable,
    Schema,
};
use sea_orm::sea_query::{Alias, Expr, Query, SimpleExpr};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use uuid::Uuid;

const DDL: &[&str] = &[
    "CREATE TABLE product_manufacturer (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        blacklist_ids TEXT NULL
    )",
    "CREATE TABLE product (
        id TEXT PRIMARY KEY NOT NULL,
        parent_id TEXT NULL,
        manufacturer_id TEXT NULL,
        ean TEXT NOT NULL,
        stock INTEGER NOT NULL,
        price REAL NOT NULL,
        active BOOLEAN NOT NULL,
        blacklist_ids TEXT NULL
    )",
    "CREATE TABLE category (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        blacklist_ids TEXT NULL
    )",
    "CREATE TABLE product_category (
        product_id TEXT NOT NULL,
        category_id TEXT NOT NULL,
        PRIMARY KEY (product_id, category_id)
    )",
];

pub fn catalog_schema() -> Schema {
    let product = EntityDefinition::builder("product", "product")
        .primary_key("id")
        .field(Field::new("parent_id", FieldKind::Id))
        .field(Field::new("manufacturer_id", FieldKind::Id))
        .field(Field::new("ean", FieldKind::String))
        .field(Field::new("stock", FieldKind::Int))
        .field(Field::new("price", FieldKind::Float))
        .field(Field::new("active", FieldKind::Bool))
        .field(Field::new("blacklist_ids", FieldKind::RuleIds))
        .parent("parent_id")
        .blacklist("blacklist_ids", true)
        .association(Association::to_one(
            "manufacturer",
            "product_manufacturer",
            "manufacturer_id",
            "id",
        ))
        .association(Association::to_many("children", "product", "id", "parent_id"))
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
        .blacklist("blacklist_ids", false)
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
        .field(Field::new("blacklist_ids", FieldKind::RuleIds))
        .blacklist("blacklist_ids", false)
        .association(Association::many_to_many(
            "products",
            "product",
            MappingTable::new("product_category", "category_id", "product_id"),
            "id",
            "id",
        ))
        .build()
        .unwrap();

    Schema::builder()
        .register(product)
        .register(manufacturer)
        .register(category)
        .build()
        .unwrap()
}

pub struct Catalog {
    pub db: Arc<DatabaseConnection>,
    pub schema: Arc<Schema>,
    pub rule: RuleId,
    pub acme: Uuid,
    pub globex: Uuid,
    pub plain: Uuid,
    pub blocked: Uuid,
    pub globex_product: Uuid,
    pub inheriting_variant: Uuid,
    pub overriding_variant: Uuid,
    pub shoes: Uuid,
    pub hidden: Uuid,
}

impl Catalog {
    pub async fn seed() -> Self {
        let mut opts = ConnectOptions::new("sqlite::memory:");
        opts.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opts).await.expect("sqlite connects");
        for ddl in DDL {
            db.execute_unprepared(ddl).await.expect("ddl applies");
        }

        let catalog = Self {
            db: Arc::new(db),
            schema: Arc::new(catalog_schema()),
            rule: RuleId::random(),
            acme: Uuid::new_v4(),
            globex: Uuid::new_v4(),
            plain: Uuid::new_v4(),
            blocked: Uuid::new_v4(),
            globex_product: Uuid::new_v4(),
            inheriting_variant: Uuid::new_v4(),
            overriding_variant: Uuid::new_v4(),
            shoes: Uuid::new_v4(),
            hidden: Uuid::new_v4(),
        };
        catalog.fill().await;
        catalog
    }

    async fn fill(&self) {
        let rule = Some(vec![self.rule]);

        self.manufacturer(self.acme, "acme", None).await;
        self.manufacturer(self.globex, "globex", rule.clone()).await;

        self.product(self.plain, None, self.acme, "A-1", 5, None)
            .await;
        self.product(self.blocked, None, self.acme, "A-2", 0, rule.clone())
            .await;
        self.product(self.globex_product, None, self.globex, "B-1", 3, None)
            .await;
        self.product(
            self.inheriting_variant,
            Some(self.blocked),
            self.acme,
            "A-2.1",
            1,
            None,
        )
        .await;
        self.product(
            self.overriding_variant,
            Some(self.blocked),
            self.acme,
            "A-2.2",
            2,
            Some(Vec::new()),
        )
        .await;

        self.category(self.shoes, "shoes", None).await;
        self.category(self.hidden, "hidden", rule).await;
        self.link(self.plain, self.shoes).await;
        self.link(self.plain, self.hidden).await;
        self.link(self.globex_product, self.shoes).await;
    }

    pub fn repository(&self, entity: &str) -> EntityRepository {
        self.repository_with(entity, DalConfig::default())
    }

    pub fn repository_with(&self, entity: &str, config: DalConfig) -> EntityRepository {
        EntityRepository::new(self.schema.clone(), entity, self.db.clone(), config).unwrap()
    }

    pub async fn set_stock(&self, product: Uuid, stock: i64) {
        self.update(product, "stock", stock.into()).await;
    }

    /// Store `raw` verbatim as the product's own blacklist.
    pub async fn set_raw_blacklist(&self, product: Uuid, raw: &str) {
        self.update(product, "blacklist_ids", raw.into()).await;
    }

    async fn update(&self, product: Uuid, column: &str, value: sea_orm::Value) {
        let mut stmt = Query::update();
        stmt.table(Alias::new("product"))
            .value(Alias::new(column), SimpleExpr::from(value))
            .and_where(Expr::col(Alias::new("id")).eq(id_value(product)));
        let backend = self.db.get_database_backend();
        self.db.execute(backend.build(&stmt)).await.expect("update");
    }

    async fn manufacturer(&self, id: Uuid, name: &str, blacklist: Option<Vec<RuleId>>) {
        self.insert(
            "product_manufacturer",
            vec![
                ("id", id_value(id)),
                ("name", name.into()),
                ("blacklist_ids", blacklist_value(blacklist)),
            ],
        )
        .await;
    }

    #[allow(clippy::cast_precision_loss)]
    async fn product(
        &self,
        id: Uuid,
        parent: Option<Uuid>,
        manufacturer: Uuid,
        ean: &str,
        stock: i64,
        blacklist: Option<Vec<RuleId>>,
    ) {
        self.insert(
            "product",
            vec![
                ("id", id_value(id)),
                ("parent_id", parent.map(|p| p.to_string()).into()),
                ("manufacturer_id", id_value(manufacturer)),
                ("ean", ean.into()),
                ("stock", stock.into()),
                ("price", (stock as f64 * 10.0 + 0.5).into()),
                ("active", (stock > 0).into()),
                ("blacklist_ids", blacklist_value(blacklist)),
            ],
        )
        .await;
    }

    async fn category(&self, id: Uuid, name: &str, blacklist: Option<Vec<RuleId>>) {
        self.insert(
            "category",
            vec![
                ("id", id_value(id)),
                ("name", name.into()),
                ("blacklist_ids", blacklist_value(blacklist)),
            ],
        )
        .await;
    }

    async fn link(&self, product: Uuid, category: Uuid) {
        self.insert(
            "product_category",
            vec![
                ("product_id", id_value(product)),
                ("category_id", id_value(category)),
            ],
        )
        .await;
    }

    async fn insert(&self, table: &str, row: Vec<(&str, sea_orm::Value)>) {
        let (columns, values): (Vec<_>, Vec<_>) = row.into_iter().unzip();
        let mut stmt = Query::insert();
        stmt.into_table(Alias::new(table))
            .columns(columns.into_iter().map(Alias::new))
            .values_panic(values.into_iter().map(SimpleExpr::from));
        let backend = self.db.get_database_backend();
        self.db.execute(backend.build(&stmt)).await.expect("insert");
    }
}

fn id_value(id: Uuid) -> sea_orm::Value {
    id.to_string().into()
}

fn blacklist_value(rules: Option<Vec<RuleId>>) -> sea_orm::Value {
    rules
        .map(|r| serde_json::to_string(&r).expect("rule ids serialize"))
        .into()
}
