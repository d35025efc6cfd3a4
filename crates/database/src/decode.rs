use crate::error::DbError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use core_types::{Row, Value};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgArguments, PgRow, PgValueFormat};
use sqlx::query::Query;
use sqlx::{Column, Postgres, Row as _, TypeInfo, ValueRef};
use uuid::Uuid;

/// Decodes every column of a PostgreSQL row into driver-independent values.
pub fn decode_row(row: &PgRow) -> Result<Row, DbError> {
    row.columns()
        .iter()
        .map(|column| decode_column(row, column.ordinal(), column.name(), column.type_info().name()))
        .collect()
}

/// Names of the columns in a row, in order.
pub fn column_names(row: &PgRow) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

fn decode_column(row: &PgRow, idx: usize, name: &str, type_name: &str) -> Result<Value, DbError> {
    let value: Value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.into(),
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(|v| Value::Int(v.into())).unwrap_or(Value::Null),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(|v| Value::Int(v.into())).unwrap_or(Value::Null),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.into(),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx)?.map(|v| Value::Float(v.into())).unwrap_or(Value::Null),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.into(),
        "NUMERIC" => row.try_get::<Option<Decimal>, _>(idx)?.map(Value::Decimal).unwrap_or(Value::Null),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(idx)?.into()
        }
        "DATE" => row.try_get::<Option<NaiveDate>, _>(idx)?.map(Value::Date).unwrap_or(Value::Null),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(Value::DateTime)
            .unwrap_or(Value::Null),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(idx)?
            .map(Value::Timestamp)
            .unwrap_or(Value::Null),
        "UUID" => row.try_get::<Option<Uuid>, _>(idx)?.map(Value::Uuid).unwrap_or(Value::Null),
        "JSON" | "JSONB" => row.try_get::<Option<JsonValue>, _>(idx)?.map(Value::Json).unwrap_or(Value::Null),
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(idx)?
            .map(|t| Value::Text(t.to_string()))
            .unwrap_or(Value::Null),
        other => decode_as_text(row, idx, name, other)?,
    };
    Ok(value)
}

/// Intervals, arrays, network addresses, enums and the like have no `Value`
/// counterpart. Rows fetched over the simple query protocol carry every column
/// in PostgreSQL's text form, which is kept as is. Binary-format columns of
/// these types cannot be rendered and are an error.
fn decode_as_text(row: &PgRow, idx: usize, name: &str, type_name: &str) -> Result<Value, DbError> {
    let unsupported = || DbError::UnsupportedColumnType {
        column: name.to_string(),
        type_name: type_name.to_string(),
    };
    let raw = row.try_get_raw(idx)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    match raw.format() {
        PgValueFormat::Text => raw
            .as_str()
            .map(|text| Value::Text(text.to_string()))
            .map_err(|_| unsupported()),
        PgValueFormat::Binary => Err(unsupported()),
    }
}

/// Binds a value as the next positional parameter of a query.
///
/// `Null` is sent as a text-typed null. Where the target column type is known,
/// prefer the typed binding in `frames`.
pub fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(x) => query.bind(*x),
        Value::Decimal(d) => query.bind(*d),
        Value::Text(s) => query.bind(s.clone()),
        Value::Date(d) => query.bind(*d),
        Value::DateTime(dt) => query.bind(*dt),
        Value::Timestamp(ts) => query.bind(*ts),
        Value::Uuid(u) => query.bind(*u),
        Value::Json(j) => query.bind(j.clone()),
    }
}
