use sea_orm::DbBackend;
use sea_orm::sea_query::{Expr, SimpleExpr};

use crate::plan::{BlacklistExpr, Exclusion};

/// Form in which blacklist entries and active rules are compared: lowercase
/// hex digits without hyphens. The SQL predicate applies the same
/// normalization through `LOWER(REPLACE(.., '-', ''))`.
#[must_use]
pub fn normalize_rule(raw: &str) -> String {
    raw.replace('-', "").to_lowercase()
}

/// SQL flavour used to render the parts sea-query has no builder for
/// (JSON array membership and the correlated parent lookup).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
    MySql,
}

impl From<DbBackend> for Dialect {
    fn from(backend: DbBackend) -> Self {
        match backend {
            DbBackend::Sqlite => Self::Sqlite,
            DbBackend::Postgres => Self::Postgres,
            DbBackend::MySql => Self::MySql,
        }
    }
}

impl Dialect {
    #[must_use]
    pub fn quote(self, ident: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
            Self::Sqlite | Self::Postgres => format!("\"{}\"", ident.replace('"', "\"\"")),
        }
    }

    fn column(self, alias: &str, column: &str) -> String {
        format!("{}.{}", self.quote(alias), self.quote(column))
    }

    /// SQL expression yielding the effective blacklist (JSON text) of the
    /// row bound to `alias`.
    #[must_use]
    pub fn blacklist_sql(self, alias: &str, expr: &BlacklistExpr) -> String {
        match expr {
            BlacklistExpr::Own { column } => self.column(alias, column),
            BlacklistExpr::Inherited {
                column,
                parent_column,
                table,
                primary_key,
            } => {
                let parent = format!("{alias}__parent");
                format!(
                    "COALESCE({own}, (SELECT {inherited} FROM {table} AS {parent_alias} WHERE {parent_key} = {link}))",
                    own = self.column(alias, column),
                    inherited = self.column(&parent, column),
                    table = self.quote(table),
                    parent_alias = self.quote(&parent),
                    parent_key = self.column(&parent, primary_key),
                    link = self.column(alias, parent_column),
                )
            }
        }
    }

    /// Predicate that holds when the effective blacklist of `alias` shares
    /// no identifier with the exclusion's rules. A `NULL` or empty blacklist
    /// always passes.
    ///
    /// Stored entries are normalized before the comparison, so ids kept in
    /// simple or uppercase form are matched like hyphenated ones.
    #[must_use]
    pub fn exclusion(self, alias: &str, exclusion: &Exclusion) -> SimpleExpr {
        let blacklist = self.blacklist_sql(alias, &exclusion.expr);
        let placeholders = vec!["?"; exclusion.rules.len()].join(", ");
        let entry = format!("LOWER(REPLACE({}, '-', ''))", self.column("bl", "value"));
        let sql = match self {
            Self::Sqlite => format!(
                "NOT EXISTS (SELECT 1 FROM json_each({blacklist}) AS \"bl\" WHERE {entry} IN ({placeholders}))"
            ),
            Self::Postgres => format!(
                "NOT EXISTS (SELECT 1 FROM jsonb_array_elements_text(CAST({blacklist} AS jsonb)) AS \"bl\"(\"value\") WHERE {entry} IN ({placeholders}))"
            ),
            Self::MySql => format!(
                "NOT EXISTS (SELECT 1 FROM JSON_TABLE({blacklist}, '$[*]' COLUMNS (`value` VARCHAR(64) PATH '$')) AS `bl` WHERE {entry} IN ({placeholders}))"
            ),
        };
        Expr::cust_with_values(
            sql,
            exclusion
                .rules
                .iter()
                .map(|rule| rule.as_uuid().simple().to_string()),
        )
    }
}
