#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

//! In-memory SQLite catalog for listing tests.
//!
//! ```text
//! product1   P1    closeout, stock 0, 3 variants, in clothing
//!   product1-red    P1.1  stock 5  option red
//!   product1-green  P1.2  stock 2  option green
//!   product1-blue   P1.3  stock 0  option blue
//! product2   P2    closeout, stock 0, in clothing
//! product3   P3    closeout, stock 0, in clothing
//! shirt      S1    stock 4, in clothing
//! ```

use std::sync::Arc;

use product_listing::{ListingConfig, ListingService, catalog_schema};
use rulegate_context::RuleId;
use rulegate_dal::DalConfig;
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
        product_number TEXT NOT NULL,
        name TEXT NOT NULL,
        stock INTEGER NOT NULL,
        is_closeout BOOLEAN NOT NULL,
        active BOOLEAN NOT NULL,
        child_count INTEGER NOT NULL DEFAULT 0,
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
    "CREATE TABLE property_group (
        id TEXT PRIMARY KEY NOT NULL,
        name TEXT NOT NULL
    )",
    "CREATE TABLE property_group_option (
        id TEXT PRIMARY KEY NOT NULL,
        group_id TEXT NOT NULL,
        name TEXT NOT NULL,
        blacklist_ids TEXT NULL
    )",
    "CREATE TABLE product_option (
        product_id TEXT NOT NULL,
        option_id TEXT NOT NULL,
        PRIMARY KEY (product_id, option_id)
    )",
];

pub struct Catalog {
    pub db: Arc<DatabaseConnection>,
    pub clothing: Uuid,
    pub color: Uuid,
    pub red: Uuid,
    pub green: Uuid,
    pub blue: Uuid,
    pub product1: Uuid,
    pub product1_red: Uuid,
    pub product1_green: Uuid,
    pub product1_blue: Uuid,
    pub product2: Uuid,
    pub product3: Uuid,
    pub shirt: Uuid,
}

/// Product row as seeded.
struct Row<'a> {
    id: Uuid,
    parent: Option<Uuid>,
    number: &'a str,
    name: &'a str,
    stock: i64,
    closeout: bool,
    children: i64,
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
            clothing: Uuid::new_v4(),
            color: Uuid::new_v4(),
            red: Uuid::new_v4(),
            green: Uuid::new_v4(),
            blue: Uuid::new_v4(),
            product1: Uuid::new_v4(),
            product1_red: Uuid::new_v4(),
            product1_green: Uuid::new_v4(),
            product1_blue: Uuid::new_v4(),
            product2: Uuid::new_v4(),
            product3: Uuid::new_v4(),
            shirt: Uuid::new_v4(),
        };
        catalog.fill().await;
        catalog
    }

    async fn fill(&self) {
        self.insert(
            "category",
            vec![("id", id_value(self.clothing)), ("name", "clothing".into())],
        )
        .await;
        self.insert(
            "property_group",
            vec![("id", id_value(self.color)), ("name", "color".into())],
        )
        .await;
        for (option, name) in [(self.red, "red"), (self.green, "green"), (self.blue, "blue")] {
            self.insert(
                "property_group_option",
                vec![
                    ("id", id_value(option)),
                    ("group_id", id_value(self.color)),
                    ("name", name.into()),
                ],
            )
            .await;
        }

        let rows = [
            Row {
                id: self.product1,
                parent: None,
                number: "P1",
                name: "product1",
                stock: 0,
                closeout: true,
                children: 3,
            },
            Row {
                id: self.product1_red,
                parent: Some(self.product1),
                number: "P1.1",
                name: "product1-red",
                stock: 5,
                closeout: true,
                children: 0,
            },
            Row {
                id: self.product1_green,
                parent: Some(self.product1),
                number: "P1.2",
                name: "product1-green",
                stock: 2,
                closeout: true,
                children: 0,
            },
            Row {
                id: self.product1_blue,
                parent: Some(self.product1),
                number: "P1.3",
                name: "product1-blue",
                stock: 0,
                closeout: true,
                children: 0,
            },
            Row {
                id: self.product2,
                parent: None,
                number: "P2",
                name: "product2",
                stock: 0,
                closeout: true,
                children: 0,
            },
            Row {
                id: self.product3,
                parent: None,
                number: "P3",
                name: "product3",
                stock: 0,
                closeout: true,
                children: 0,
            },
            Row {
                id: self.shirt,
                parent: None,
                number: "S1",
                name: "shirt",
                stock: 4,
                closeout: false,
                children: 0,
            },
        ];
        for row in &rows {
            self.product(row).await;
        }

        for product in [self.product1, self.product2, self.product3, self.shirt] {
            self.link("product_category", "category_id", product, self.clothing)
                .await;
        }
        for (variant, option) in [
            (self.product1_red, self.red),
            (self.product1_green, self.green),
            (self.product1_blue, self.blue),
        ] {
            self.link("product_option", "option_id", variant, option).await;
        }
    }

    pub fn service(&self, config: ListingConfig) -> ListingService {
        ListingService::new(
            Arc::new(catalog_schema().unwrap()),
            self.db.clone(),
            config,
            DalConfig::default(),
        )
        .unwrap()
    }

    pub fn hiding_closeouts() -> ListingConfig {
        ListingConfig {
            hide_closeout_products_when_out_of_stock: true,
            ..ListingConfig::default()
        }
    }

    /// Put `rule` on the product's own blacklist.
    pub async fn blacklist(&self, product: Uuid, rule: RuleId) {
        let mut stmt = Query::update();
        stmt.table(Alias::new("product"))
            .value(
                Alias::new("blacklist_ids"),
                serde_json::to_string(&[rule]).unwrap(),
            )
            .and_where(Expr::col(Alias::new("id")).eq(id_value(product)));
        let backend = self.db.get_database_backend();
        self.db.execute(backend.build(&stmt)).await.expect("update");
    }

    async fn product(&self, row: &Row<'_>) {
        self.insert(
            "product",
            vec![
                ("id", id_value(row.id)),
                ("parent_id", row.parent.map(|p| p.to_string()).into()),
                ("product_number", row.number.into()),
                ("name", row.name.into()),
                ("stock", row.stock.into()),
                ("is_closeout", row.closeout.into()),
                ("active", true.into()),
                ("child_count", row.children.into()),
            ],
        )
        .await;
    }

    async fn link(&self, table: &str, column: &str, product: Uuid, target: Uuid) {
        self.insert(
            table,
            vec![("product_id", id_value(product)), (column, id_value(target))],
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
