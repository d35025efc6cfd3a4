use crate::error::CoreError;
use crate::value::{Row, Value};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// A column-named, row-major block of data.
///
/// This is the shape everything tabular travels in: records fetched from the
/// statistics source, whole tables read from the database, and tables written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from rows, rejecting any row whose width differs from the header.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, CoreError> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Builds a table from a list of JSON objects.
    ///
    /// Columns appear in the order keys are first seen across all records. A record
    /// that lacks a column gets `Null` in that position, and non-object records
    /// become an all-null row.
    pub fn from_json_records(records: &[JsonValue]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            if let JsonValue::Object(obj) = record {
                for key in obj.keys() {
                    if !columns.iter().any(|c| c == key) {
                        columns.push(key.clone());
                    }
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|col| match record {
                        JsonValue::Object(obj) => {
                            obj.get(col).map(Value::from_json).unwrap_or(Value::Null)
                        }
                        _ => Value::Null,
                    })
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    pub fn push_row(&mut self, row: Row) -> Result<(), CoreError> {
        if row.len() != self.columns.len() {
            return Err(CoreError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Keeps only the rows for which `keep` returns true.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String], &Row) -> bool,
    {
        let columns = &self.columns;
        self.rows.retain(|row| keep(columns, row));
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `(rows, columns)`, the same way a dataframe reports its shape.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_records_keep_first_seen_column_order() {
        let records = vec![
            json!({"id": 1, "hteam": "Richmond", "hscore": 105}),
            json!({"id": 2, "hteam": "Carlton", "venue": "MCG"}),
        ];
        let table = Table::from_json_records(&records);

        assert_eq!(table.columns(), &["id", "hteam", "hscore", "venue"]);
        assert_eq!(table.shape(), (2, 4));
        assert_eq!(table.rows()[0][3], Value::Null);
        assert_eq!(table.rows()[1][2], Value::Null);
        assert_eq!(table.rows()[1][3], Value::Text("MCG".into()));
    }

    #[test]
    fn non_object_records_become_null_rows() {
        let records = vec![json!({"a": 1}), json!("oops")];
        let table = Table::from_json_records(&records);
        assert_eq!(table.rows()[1], vec![Value::Null]);
    }

    #[test]
    fn push_row_rejects_wrong_width() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        let err = table.push_row(vec![Value::Int(1)]).unwrap_err();
        assert_eq!(err, CoreError::RowWidth { expected: 2, found: 1 });
    }

    #[test]
    fn retain_rows_filters_by_column() {
        let mut table = Table::from_json_records(&[
            json!({"id": 1, "complete": 100}),
            json!({"id": 2, "complete": 0}),
        ]);
        table.retain_rows(|cols, row| {
            let idx = cols.iter().position(|c| c == "complete").unwrap();
            row[idx] == Value::Int(100)
        });
        assert_eq!(table.column("id").unwrap(), vec![&Value::Int(1)]);
    }
}
