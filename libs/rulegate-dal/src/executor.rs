//! Seam between compiled statements and the database.

use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DbBackend, DbErr, QueryResult, Statement};

/// Runs read statements. Implemented for every sea-orm connection
/// (`DatabaseConnection`, `DatabaseTransaction`).
#[async_trait]
pub trait StorageExecutor: Send + Sync {
    /// Backend the statements are rendered for.
    fn backend(&self) -> DbBackend;

    /// Execute `stmt` and return all rows.
    async fn fetch_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr>;
}

#[async_trait]
impl<C> StorageExecutor for C
where
    C: ConnectionTrait + Send + Sync,
{
    fn backend(&self) -> DbBackend {
        self.get_database_backend()
    }

    async fn fetch_all(&self, stmt: Statement) -> Result<Vec<QueryResult>, DbErr> {
        self.query_all(stmt).await
    }
}
