use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Database operation failed: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Expected at most one row but the query returned {0}")]
    TooManyRows(usize),

    #[error("Expected exactly one column but the query returned {0}")]
    UnexpectedColumnCount(usize),

    #[error("Column '{column}' has type {type_name}, which cannot be decoded")]
    UnsupportedColumnType { column: String, type_name: String },

    #[error("Table '{0}' already exists")]
    TableExists(String),

    #[error("'{0}' is not a valid SQL identifier")]
    InvalidIdentifier(String),

    #[error("Refusing to write table '{0}' with no columns")]
    EmptyTable(String),

    #[error("Malformed table: {0}")]
    Table(#[from] core_types::CoreError),

    #[error("The session has already been committed or rolled back")]
    SessionClosed,
}
