use crate::connection::connect;
use crate::decode::decode_row;
use crate::error::DbError;
use crate::executor::{QueryExecutor, SessionFactory};
use async_trait::async_trait;
use configuration::Config;
use core_types::Row;
use sqlx::postgres::{PgConnection, PgPool};
use sqlx::{Postgres, Transaction};

/// The pooled entry point to the warehouse database.
///
/// Cheap to clone; every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
    label: String,
}

impl Database {
    /// Wraps an existing pool. `label` names the database in log messages.
    pub fn new(pool: PgPool, label: impl Into<String>) -> Self {
        Self {
            pool,
            label: label.into(),
        }
    }

    /// Connects using the credentials and pool settings of the application config.
    pub async fn connect(config: &Config) -> Result<Self, DbError> {
        let pool = connect(&config.credentials, &config.database).await?;
        Ok(Self::new(pool, config.credentials.label()))
    }

    /// Starts a new transactional session.
    pub async fn begin(&self) -> Result<DbSession, DbError> {
        let tx = self.pool.begin().await?;
        tracing::debug!(database = %self.label, "BEGIN");
        Ok(DbSession {
            tx: Some(tx),
            label: self.label.clone(),
        })
    }

    /// Lists every table visible to the connected user, in one session.
    pub async fn list_tables(&self) -> Result<Vec<String>, DbError> {
        let mut session = self.begin().await?;
        let tables = session.list_tables().await;
        session.finish(tables.is_ok()).await?;
        tables
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Disconnected from {} database", self.label);
    }
}

/// One database transaction.
///
/// Call `commit` when the work succeeded and `rollback` when it did not. A
/// session dropped without either is rolled back by the driver.
pub struct DbSession {
    tx: Option<Transaction<'static, Postgres>>,
    label: String,
}

impl DbSession {
    pub async fn commit(mut self) -> Result<(), DbError> {
        let tx = self.tx.take().ok_or(DbError::SessionClosed)?;
        tx.commit().await?;
        tracing::debug!(database = %self.label, "COMMIT");
        Ok(())
    }

    pub async fn rollback(mut self) -> Result<(), DbError> {
        let tx = self.tx.take().ok_or(DbError::SessionClosed)?;
        tx.rollback().await?;
        tracing::debug!(database = %self.label, "ROLLBACK");
        Ok(())
    }

    /// Commits when `succeeded`, otherwise rolls back.
    pub async fn finish(self, succeeded: bool) -> Result<(), DbError> {
        if succeeded {
            self.commit().await
        } else {
            self.rollback().await
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn conn(&mut self) -> Result<&mut PgConnection, DbError> {
        self.tx.as_deref_mut().ok_or(DbError::SessionClosed)
    }
}

impl Drop for DbSession {
    fn drop(&mut self) {
        if self.tx.is_some() {
            tracing::warn!(
                database = %self.label,
                "Session dropped without commit or rollback; the transaction will be rolled back."
            );
        }
    }
}

#[async_trait]
impl QueryExecutor for DbSession {
    async fn fetch_all(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        self.select_text(sql).await
    }

    async fn commit(self: Box<Self>) -> Result<(), DbError> {
        DbSession::commit(*self).await
    }

    async fn rollback(self: Box<Self>) -> Result<(), DbError> {
        DbSession::rollback(*self).await
    }
}

#[async_trait]
impl SessionFactory for Database {
    async fn open(&self) -> Result<Box<dyn QueryExecutor>, DbError> {
        Ok(Box::new(self.begin().await?))
    }
}

/// Decodes a batch of driver rows.
pub(crate) fn decode_rows(rows: &[sqlx::postgres::PgRow]) -> Result<Vec<Row>, DbError> {
    rows.iter().map(decode_row).collect()
}
