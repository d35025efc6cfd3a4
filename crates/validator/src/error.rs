use crate::outcome::{ValidationOutcome, describe_outcomes, names};
use database::DbError;
use std::time::Duration;
use thiserror::Error;

/// One or more ABORT validations returned rows. The enclosing pipeline must stop.
#[derive(Error, Debug)]
#[error("critical validation failed on validations {:?}. {}", names(.outcomes), describe_outcomes(.outcomes))]
pub struct AbortError {
    /// Every ABORT outcome of the run, in catalog order.
    pub outcomes: Vec<ValidationOutcome>,
}

/// One or more FAIL validations returned rows and nothing aborted.
#[derive(Error, Debug)]
#[error("{} validation failures on validations {:?}. Validation returned: {}", .outcomes.len(), names(.outcomes), describe_outcomes(.outcomes))]
pub struct FailError {
    /// Every FAIL outcome of the run, in catalog order.
    pub outcomes: Vec<ValidationOutcome>,
}

#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error(transparent)]
    Abort(#[from] AbortError),

    #[error(transparent)]
    Fail(#[from] FailError),

    #[error("Validation '{validation}' could not be executed: {source}")]
    Execution {
        validation: String,
        #[source]
        source: DbError,
    },

    #[error("Validation '{validation}' did not finish within {timeout:?}")]
    Timeout { validation: String, timeout: Duration },

    #[error("Database session error: {0}")]
    Session(#[source] DbError),

    #[error("Validation catalog '{0}' not found")]
    CatalogNotFound(String),

    #[error("Validation '{name}' appears more than once in catalog '{catalog}'")]
    DuplicateValidation { catalog: String, name: String },
}

impl ValidatorError {
    pub fn is_abort(&self) -> bool {
        matches!(self, ValidatorError::Abort(_))
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, ValidatorError::Fail(_))
    }
}
