use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Row has {found} values but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },
}
