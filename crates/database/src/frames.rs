use crate::error::DbError;
use crate::decode::column_names;
use crate::session::{DbSession, decode_rows};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use core_types::{Table, Value};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::query_builder::Separated;
use sqlx::{Column, Executor, Postgres, QueryBuilder, Row as _};
use std::time::Instant;
use uuid::Uuid;

/// Default number of cells (rows × columns) inserted per statement.
pub const DEFAULT_CHUNK_CELLS: usize = 1_000_000;

/// PostgreSQL accepts at most this many bind parameters in one statement.
const MAX_BIND_PARAMS: usize = u16::MAX as usize;

/// What to do when the target table of a write already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Drop and recreate the table.
    Replace,
    /// Insert into the existing table, creating it if missing.
    Append,
    /// Refuse to write.
    Fail,
}

/// The SQL column type chosen for a table column from the values it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    BigInt,
    Double,
    Numeric,
    Text,
    Date,
    Timestamp,
    TimestampTz,
    Uuid,
    Jsonb,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::Text => "TEXT",
            ColumnType::Date => "DATE",
            ColumnType::Timestamp => "TIMESTAMP",
            ColumnType::TimestampTz => "TIMESTAMPTZ",
            ColumnType::Uuid => "UUID",
            ColumnType::Jsonb => "JSONB",
        }
    }

    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(ColumnType::Boolean),
            Value::Int(_) => Some(ColumnType::BigInt),
            Value::Float(_) => Some(ColumnType::Double),
            Value::Decimal(_) => Some(ColumnType::Numeric),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Date(_) => Some(ColumnType::Date),
            Value::DateTime(_) => Some(ColumnType::Timestamp),
            Value::Timestamp(_) => Some(ColumnType::TimestampTz),
            Value::Uuid(_) => Some(ColumnType::Uuid),
            Value::Json(_) => Some(ColumnType::Jsonb),
        }
    }

    /// Picks the narrowest type that holds every non-null value.
    ///
    /// Integers widen to floats or decimals when mixed with them; any other mix,
    /// and a column of nothing but nulls, becomes text.
    pub fn infer<'a>(values: impl IntoIterator<Item = &'a Value>) -> Self {
        let mut inferred: Option<ColumnType> = None;
        for ty in values.into_iter().filter_map(ColumnType::of) {
            inferred = Some(match (inferred, ty) {
                (None, ty) => ty,
                (Some(a), b) if a == b => a,
                (Some(ColumnType::BigInt), ColumnType::Double)
                | (Some(ColumnType::Double), ColumnType::BigInt) => ColumnType::Double,
                (Some(ColumnType::BigInt), ColumnType::Numeric)
                | (Some(ColumnType::Numeric), ColumnType::BigInt) => ColumnType::Numeric,
                _ => return ColumnType::Text,
            });
        }
        inferred.unwrap_or(ColumnType::Text)
    }
}

/// Double-quotes an identifier so any table or column name is safe to splice into SQL.
pub fn quote_identifier(name: &str) -> Result<String, DbError> {
    if name.is_empty() || name.contains('\0') {
        return Err(DbError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// How many rows go into one INSERT for a table of `columns` columns.
pub fn rows_per_chunk(columns: usize, chunk_cells: usize) -> usize {
    let columns = columns.max(1);
    let upper = (MAX_BIND_PARAMS / columns).max(1);
    (chunk_cells / columns).clamp(1, upper)
}

fn push_typed(sep: &mut Separated<'_, '_, Postgres, &'static str>, value: &Value, ty: ColumnType) {
    match (ty, value) {
        (ColumnType::Boolean, Value::Bool(b)) => sep.push_bind(*b),
        (ColumnType::Boolean, _) => sep.push_bind(None::<bool>),
        (ColumnType::BigInt, Value::Int(i)) => sep.push_bind(*i),
        (ColumnType::BigInt, _) => sep.push_bind(None::<i64>),
        (ColumnType::Double, Value::Float(x)) => sep.push_bind(*x),
        (ColumnType::Double, Value::Int(i)) => sep.push_bind(*i as f64),
        (ColumnType::Double, _) => sep.push_bind(None::<f64>),
        (ColumnType::Numeric, Value::Decimal(d)) => sep.push_bind(*d),
        (ColumnType::Numeric, Value::Int(i)) => sep.push_bind(Decimal::from(*i)),
        (ColumnType::Numeric, _) => sep.push_bind(None::<Decimal>),
        (ColumnType::Date, Value::Date(d)) => sep.push_bind(*d),
        (ColumnType::Date, _) => sep.push_bind(None::<NaiveDate>),
        (ColumnType::Timestamp, Value::DateTime(dt)) => sep.push_bind(*dt),
        (ColumnType::Timestamp, _) => sep.push_bind(None::<NaiveDateTime>),
        (ColumnType::TimestampTz, Value::Timestamp(ts)) => sep.push_bind(*ts),
        (ColumnType::TimestampTz, _) => sep.push_bind(None::<DateTime<Utc>>),
        (ColumnType::Uuid, Value::Uuid(u)) => sep.push_bind(*u),
        (ColumnType::Uuid, _) => sep.push_bind(None::<Uuid>),
        (ColumnType::Jsonb, Value::Json(j)) => sep.push_bind(j.clone()),
        (ColumnType::Jsonb, _) => sep.push_bind(None::<JsonValue>),
        (ColumnType::Text, Value::Null) => sep.push_bind(None::<String>),
        (ColumnType::Text, other) => sep.push_bind(other.to_string()),
    };
}

/// Whole-table reads and writes, the warehouse equivalent of dataframe I/O.
impl DbSession {
    /// Writes `table` to `name`, creating the table with inferred column types.
    ///
    /// Rows are inserted in chunks of roughly `chunk_cells` cells. Returns the
    /// number of rows inserted.
    pub async fn write_table(
        &mut self,
        name: &str,
        table: &Table,
        mode: WriteMode,
        chunk_cells: usize,
    ) -> Result<u64, DbError> {
        let started = Instant::now();
        if table.columns().is_empty() {
            return Err(DbError::EmptyTable(name.to_string()));
        }

        let quoted_table = quote_identifier(name)?;
        let quoted_columns = table
            .columns()
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Result<Vec<_>, _>>()?;
        let types: Vec<ColumnType> = (0..table.columns().len())
            .map(|idx| ColumnType::infer(table.rows().iter().map(|row| &row[idx])))
            .collect();

        let exists = self.table_exists(name).await?;
        match (mode, exists) {
            (WriteMode::Fail, true) => return Err(DbError::TableExists(name.to_string())),
            (WriteMode::Append, true) => {}
            (WriteMode::Replace, true) => {
                self.query(&format!("DROP TABLE {}", quoted_table)).await?;
                self.create_table(&quoted_table, &quoted_columns, &types).await?;
            }
            (_, false) => self.create_table(&quoted_table, &quoted_columns, &types).await?,
        }

        let mut inserted = 0;
        let chunk_rows = rows_per_chunk(types.len(), chunk_cells);
        for chunk in table.rows().chunks(chunk_rows) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
                "INSERT INTO {} ({}) ",
                quoted_table,
                quoted_columns.join(", ")
            ));
            builder.push_values(chunk, |mut sep, row| {
                for (value, ty) in row.iter().zip(&types) {
                    push_typed(&mut sep, value, *ty);
                }
            });
            inserted += builder.build().execute(self.conn()?).await?.rows_affected();
        }

        tracing::info!(
            "Wrote name: {}, table shape: {:?}, within: {:.4}s",
            name,
            table.shape(),
            started.elapsed().as_secs_f64()
        );
        Ok(inserted)
    }

    /// Reads a whole table. `None` when the table has no rows.
    pub async fn read_table(&mut self, name: &str) -> Result<Option<Table>, DbError> {
        let started = Instant::now();
        let table = self
            .query_table(&format!("SELECT * FROM {}", quote_identifier(name)?))
            .await?;
        if table.is_empty() {
            tracing::info!("No rows to fetch from table_name: {}", name);
            return Ok(None);
        }
        tracing::info!(
            "Fetched name: {}, table shape: {:?}, within: {:.4}s",
            name,
            table.shape(),
            started.elapsed().as_secs_f64()
        );
        Ok(Some(table))
    }

    /// Runs a query and returns its result with column names attached.
    pub async fn query_table(&mut self, sql: &str) -> Result<Table, DbError> {
        let conn = self.conn()?;
        let rows = sqlx::query(sql).fetch_all(&mut *conn).await?;
        let columns = match rows.first() {
            Some(first) => column_names(first),
            // No rows to read names from, so ask the server to describe the statement.
            None => conn
                .describe(sql)
                .await?
                .columns()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
        };
        let decoded = decode_rows(&rows)?;
        Ok(Table::with_rows(columns, decoded)?)
    }

    async fn table_exists(&mut self, name: &str) -> Result<bool, DbError> {
        let row = sqlx::query(
            "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_schema = current_schema() AND table_name = $1)",
        )
        .bind(name)
        .fetch_one(self.conn()?)
        .await?;
        Ok(row.try_get::<bool, _>(0)?)
    }

    async fn create_table(
        &mut self,
        quoted_table: &str,
        quoted_columns: &[String],
        types: &[ColumnType],
    ) -> Result<(), DbError> {
        let definitions: Vec<String> = quoted_columns
            .iter()
            .zip(types)
            .map(|(col, ty)| format!("{} {}", col, ty.sql()))
            .collect();
        self.query(&format!(
            "CREATE TABLE {} ({})",
            quoted_table,
            definitions.join(", ")
        ))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_columns_widen_to_double_when_mixed_with_floats() {
        let values = [Value::Int(1), Value::Null, Value::Float(2.5)];
        assert_eq!(ColumnType::infer(values.iter()), ColumnType::Double);
    }

    #[test]
    fn mixed_kinds_fall_back_to_text() {
        let values = [Value::Int(1), Value::Text("Round 1".into())];
        assert_eq!(ColumnType::infer(values.iter()), ColumnType::Text);
    }

    #[test]
    fn all_null_columns_are_text() {
        let values = [Value::Null, Value::Null];
        assert_eq!(ColumnType::infer(values.iter()), ColumnType::Text);
        assert_eq!(ColumnType::infer(std::iter::empty()), ColumnType::Text);
    }

    #[test]
    fn uniform_columns_keep_their_type() {
        let values = [Value::Bool(true), Value::Bool(false)];
        assert_eq!(ColumnType::infer(values.iter()), ColumnType::Boolean);
        let values = [Value::Int(3), Value::Decimal(Decimal::new(125, 1))];
        assert_eq!(ColumnType::infer(values.iter()), ColumnType::Numeric);
    }

    #[test]
    fn identifiers_are_quoted_and_escaped() {
        assert_eq!(quote_identifier("results").unwrap(), "\"results\"");
        assert_eq!(quote_identifier("odd\"name").unwrap(), "\"odd\"\"name\"");
        assert!(quote_identifier("").is_err());
    }

    #[test]
    fn chunks_respect_the_bind_parameter_limit() {
        assert_eq!(rows_per_chunk(10, 1_000_000), 6_553);
        assert_eq!(rows_per_chunk(4, 100), 25);
        assert_eq!(rows_per_chunk(0, 100), 100);
        assert_eq!(rows_per_chunk(50, 10), 1);
    }
}
