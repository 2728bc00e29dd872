use sea_orm::sea_query::{
    Alias, Condition, Expr, Func, JoinType, LikeExpr, Order, Query, SelectStatement, SimpleExpr,
};

use super::Dialect;
use crate::criteria::SortDirection;
use crate::plan::{ColumnRef, Guarded, PlanFilter, Predicate, QueryPlan};
use crate::schema::EntityDefinition;
use crate::value::Value;

pub const ID_COLUMN: &str = "__id";
pub const TOTAL_COLUMN: &str = "__total";
pub const VALUE_COLUMN: &str = "__value";
pub const ROW_COLUMN: &str = "__row";
pub const BLACKLIST_COLUMN: &str = "__blacklist";
pub const OWNER_COLUMN: &str = "__owner";

/// Renders guarded plans into sea-query statements.
///
/// All joins are `LEFT JOIN`s. To-many joins fan out rows, so id queries
/// group by the root primary key and sort on `MIN`/`MAX` of the sort column.
#[derive(Debug, Clone, Copy)]
pub struct SqlCompiler {
    dialect: Dialect,
}

impl SqlCompiler {
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// `SELECT root.pk AS __id ... GROUP BY root.pk ORDER BY ... LIMIT/OFFSET`
    #[must_use]
    pub fn id_query(&self, plan: &QueryPlan<Guarded>) -> SelectStatement {
        let root_key = plan.root_key();
        let mut stmt = self.base(plan);
        stmt.expr_as(column(&root_key), Alias::new(ID_COLUMN))
            .group_by_col(column_ref(&root_key));

        for sorting in plan.sortings() {
            let (aggregate, order): (SimpleExpr, Order) = match sorting.direction {
                SortDirection::Asc => (Func::min(column(&sorting.column)).into(), Order::Asc),
                SortDirection::Desc => (Func::max(column(&sorting.column)).into(), Order::Desc),
            };
            stmt.order_by_expr(aggregate, order);
        }
        stmt.order_by(column_ref(&root_key), Order::Asc);

        if let Some(limit) = plan.limit() {
            stmt.limit(limit);
        }
        if let Some(offset) = plan.offset() {
            stmt.offset(offset);
        }
        stmt
    }

    /// `SELECT COUNT(*) AS __total FROM (<ids without window>)`
    #[must_use]
    pub fn count_query(&self, plan: &QueryPlan<Guarded>) -> SelectStatement {
        let root_key = plan.root_key();
        let mut ids = self.base(plan);
        ids.expr_as(column(&root_key), Alias::new(ID_COLUMN))
            .group_by_col(column_ref(&root_key));

        let mut stmt = Query::select();
        stmt.expr_as(Expr::cust("COUNT(*)"), Alias::new(TOTAL_COLUMN))
            .from_subquery(ids, Alias::new("__ids"));
        stmt
    }

    /// One row per distinct `(root id, row key)` of the alias holding
    /// `value`, ordered by value. `row_key` is that alias' primary key, so
    /// equal values of different joined rows stay apart while the fan-out of
    /// unrelated joins collapses.
    #[must_use]
    pub fn value_query(
        &self,
        plan: &QueryPlan<Guarded>,
        value: &ColumnRef,
        row_key: &ColumnRef,
    ) -> SelectStatement {
        let root_key = plan.root_key();
        let mut stmt = self.base(plan);
        stmt.distinct()
            .expr_as(column(&root_key), Alias::new(ID_COLUMN))
            .expr_as(column(row_key), Alias::new(ROW_COLUMN))
            .expr_as(column(value), Alias::new(VALUE_COLUMN))
            .order_by_expr(column(value).into(), Order::Asc)
            .order_by(column_ref(&root_key), Order::Asc)
            .order_by(column_ref(row_key), Order::Asc);
        stmt
    }

    /// Row query selecting every field of `def` under its field name, plus
    /// the effective blacklist and the owner key when the plan has them.
    #[must_use]
    pub fn entity_query(&self, plan: &QueryPlan<Guarded>, def: &EntityDefinition) -> SelectStatement {
        let root = plan.root();
        let mut stmt = self.base(plan);
        for field in def.fields() {
            stmt.expr_as(
                column(&ColumnRef::new(root.alias(), field.column())),
                Alias::new(field.name()),
            );
        }
        if let Some(exclusion) = root.exclusion() {
            stmt.expr_as(
                Expr::cust(self.dialect.blacklist_sql(root.alias(), &exclusion.expr)),
                Alias::new(BLACKLIST_COLUMN),
            );
        }
        if let Some(owner) = plan.owner_column() {
            stmt.expr_as(column(owner), Alias::new(OWNER_COLUMN))
                .order_by(column_ref(owner), Order::Asc);
        }
        stmt.order_by(column_ref(&plan.root_key()), Order::Asc);
        stmt
    }

    fn base(&self, plan: &QueryPlan<Guarded>) -> SelectStatement {
        let root = plan.root();
        let mut stmt = Query::select();
        stmt.from_as(Alias::new(root.table()), Alias::new(root.alias()));

        for node in plan.nodes().iter().skip(1) {
            let Some(join) = node.join() else {
                continue;
            };
            let mut on = Condition::all().add(
                Expr::col((Alias::new(node.alias()), Alias::new(&join.column)))
                    .equals((Alias::new(&join.parent_alias), Alias::new(&join.parent_column))),
            );
            if let Some(exclusion) = node.exclusion() {
                on = on.add(self.dialect.exclusion(node.alias(), exclusion));
            }
            stmt.join_as(
                JoinType::LeftJoin,
                Alias::new(node.table()),
                Alias::new(node.alias()),
                on,
            );
        }

        let mut cond = Condition::all();
        let mut restricted = false;
        if let Some(exclusion) = root.exclusion() {
            cond = cond.add(self.dialect.exclusion(root.alias(), exclusion));
            restricted = true;
        }
        for filter in plan.filters() {
            cond = cond.add(filter_condition(filter));
            restricted = true;
        }
        if restricted {
            stmt.cond_where(cond);
        }
        stmt
    }
}

fn column_ref(c: &ColumnRef) -> (Alias, Alias) {
    (Alias::new(&c.alias), Alias::new(&c.column))
}

fn column(c: &ColumnRef) -> Expr {
    Expr::col(column_ref(c))
}

fn bind(value: &Value) -> sea_orm::Value {
    value
        .to_sea_value()
        .unwrap_or(sea_orm::Value::String(None))
}

fn filter_condition(filter: &PlanFilter) -> Condition {
    match filter {
        PlanFilter::Condition {
            column: c,
            predicate,
            ..
        } => Condition::all().add(predicate_expr(c, predicate)),
        PlanFilter::And(children) if children.is_empty() => {
            Condition::all().add(Expr::cust("1 = 1"))
        }
        PlanFilter::And(children) => children
            .iter()
            .fold(Condition::all(), |cond, child| cond.add(filter_condition(child))),
        PlanFilter::Or(children) => children
            .iter()
            .fold(Condition::any(), |cond, child| cond.add(filter_condition(child))),
        PlanFilter::Not(inner) => Condition::all().add(filter_condition(inner)).not(),
    }
}

fn predicate_expr(c: &ColumnRef, predicate: &Predicate) -> SimpleExpr {
    let col = column(c);
    match predicate {
        Predicate::IsNull => col.is_null(),
        Predicate::IsNotNull => col.is_not_null(),
        Predicate::Equals(v) => col.eq(bind(v)),
        Predicate::NotEquals(v) => col.ne(bind(v)),
        Predicate::In(values) => col.is_in(values.iter().map(bind)),
        Predicate::GreaterThan(v) => col.gt(bind(v)),
        Predicate::GreaterThanOrEqual(v) => col.gte(bind(v)),
        Predicate::LessThan(v) => col.lt(bind(v)),
        Predicate::LessThanOrEqual(v) => col.lte(bind(v)),
        Predicate::Contains(needle) => {
            col.like(LikeExpr::new(format!("%{}%", escape_like(needle))).escape('\\'))
        }
    }
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
