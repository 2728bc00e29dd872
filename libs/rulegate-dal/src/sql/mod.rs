//! SQL rendering of guarded query plans.

mod compiler;
mod dialect;

pub use compiler::{
    BLACKLIST_COLUMN, ID_COLUMN, OWNER_COLUMN, ROW_COLUMN, SqlCompiler, TOTAL_COLUMN,
    VALUE_COLUMN,
};
pub use dialect::{Dialect, normalize_rule};
