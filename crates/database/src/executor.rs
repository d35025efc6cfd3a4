use crate::error::DbError;
use async_trait::async_trait;
use core_types::Row;

/// A single open, transactional session that can run queries.
///
/// A session ends with exactly one of `commit` or `rollback`; both consume it.
#[async_trait]
pub trait QueryExecutor: Send {
    /// Runs `sql` and returns every row it produced, or an empty vector.
    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DbError>;

    async fn commit(self: Box<Self>) -> Result<(), DbError>;

    async fn rollback(self: Box<Self>) -> Result<(), DbError>;
}

/// Opens sessions on demand.
///
/// Holders of a factory never connect eagerly; a connection is only taken
/// from the pool when `open` is called.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn QueryExecutor>, DbError>;
}
