use crate::Dataset;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to build or send the HTTP request: {0}")]
    RequestBuild(#[from] reqwest::Error),

    #[error("The stats API returned HTTP {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Source '{source_name}' does not provide {dataset}")]
    UnsupportedDataset { source_name: String, dataset: Dataset },

    #[error("Stats source '{0}' not found or implemented")]
    SourceNotFound(String),
}
