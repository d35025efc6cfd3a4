use crate::decode::{bind_value, decode_row};
use crate::error::DbError;
use crate::session::{DbSession, decode_rows};
use core_types::{Row, Value};
use futures::stream::{self, BoxStream, StreamExt};

/// Convenience queries on an open session. Every statement runs inside the
/// session's transaction and becomes visible to others only on commit.
impl DbSession {
    /// Executes one or more statements and returns the number of affected rows.
    pub async fn query(&mut self, sql: &str) -> Result<u64, DbError> {
        let result = sqlx::raw_sql(sql).execute(self.conn()?).await?;
        tracing::debug!("Ran Query: {}", sql);
        Ok(result.rows_affected())
    }

    /// Executes a single statement with positional (`$1`, `$2`, ...) parameters.
    pub async fn execute_with(&mut self, sql: &str, params: &[Value]) -> Result<u64, DbError> {
        let query = params
            .iter()
            .fold(sqlx::query(sql), |query, value| bind_value(query, value));
        let result = query.execute(self.conn()?).await?;
        tracing::debug!("Ran Query: {}", sql);
        Ok(result.rows_affected())
    }

    /// Executes the same statement once per parameter row.
    pub async fn execute_many(&mut self, sql: &str, param_rows: &[Row]) -> Result<u64, DbError> {
        let mut affected = 0;
        for params in param_rows {
            affected += self.execute_with(sql, params).await?;
        }
        Ok(affected)
    }

    /// Fetches every row the query produces.
    pub async fn select_all(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        let rows = sqlx::query(sql).fetch_all(self.conn()?).await?;
        tracing::debug!(rows = rows.len(), "Ran Query: {}", sql);
        decode_rows(&rows)
    }

    /// Fetches every row over the simple query protocol.
    ///
    /// Columns arrive in text form, so types without a typed `Value`
    /// (intervals, arrays, enums, ...) come back as `Value::Text` instead of
    /// failing the query. No parameters can be bound.
    pub async fn select_text(&mut self, sql: &str) -> Result<Vec<Row>, DbError> {
        let rows = sqlx::Executor::fetch_all(self.conn()?, sqlx::raw_sql(sql)).await?;
        tracing::debug!(rows = rows.len(), "Ran Query: {}", sql);
        decode_rows(&rows)
    }

    /// Fetches at most one row; more than one is an error.
    pub async fn select_one(&mut self, sql: &str) -> Result<Option<Row>, DbError> {
        let mut rows = self.select_all(sql).await?;
        if rows.len() > 1 {
            return Err(DbError::TooManyRows(rows.len()));
        }
        Ok(rows.pop())
    }

    /// The first column of every row.
    pub async fn select_array(&mut self, sql: &str) -> Result<Vec<Value>, DbError> {
        let rows = self.select_all(sql).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect())
    }

    /// The only value of a one-row, one-column query, or `None` when no row matched.
    pub async fn select_single_value(&mut self, sql: &str) -> Result<Option<Value>, DbError> {
        match self.select_one(sql).await? {
            Some(row) if row.len() != 1 => Err(DbError::UnexpectedColumnCount(row.len())),
            Some(row) => Ok(row.into_iter().next()),
            None => Ok(None),
        }
    }

    /// Streams rows as the server produces them instead of buffering the whole result.
    pub fn select_stream<'s>(&'s mut self, sql: &'s str) -> BoxStream<'s, Result<Row, DbError>> {
        match self.conn() {
            Ok(conn) => sqlx::query(sql)
                .fetch(conn)
                .map(|row| row.map_err(DbError::from).and_then(|row| decode_row(&row)))
                .boxed(),
            Err(e) => stream::once(async move { Err(e) }).boxed(),
        }
    }

    /// Names of all tables visible in the current database.
    pub async fn list_tables(&mut self) -> Result<Vec<String>, DbError> {
        let names = self
            .select_array("SELECT TABLE_NAME::text FROM INFORMATION_SCHEMA.TABLES ORDER BY TABLE_NAME;")
            .await?;
        Ok(names.into_iter().map(|v| v.to_string()).collect())
    }
}
