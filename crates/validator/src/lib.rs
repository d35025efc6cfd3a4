//! # Kickstat Validator Crate
//!
//! Runs named SQL checks against the warehouse and escalates by severity.
//! A check fails when its query returns rows; the rows are the offending records.
//!
//! ## Severity Policy
//!
//! - `OFF`: never executed.
//! - `SKIP`: logged when it returns rows, never an error.
//! - `FAIL`: reported as a `FailError` when nothing aborted.
//! - `ABORT`: reported as an `AbortError`, ahead of everything else.
//!
//! ## Public API
//!
//! - `Validator`: holds a `SessionFactory` and one `ValidationCatalog`; `run` executes it.
//! - `CatalogRegistry`: resolves a catalog by key, built-in or from configuration.
//! - `classify`: the escalation step on its own.
//! - `ValidatorError`, `AbortError`, `FailError`: what a run can fail with.

pub mod catalog;
pub mod error;
pub mod outcome;
pub mod validator;

pub use catalog::{CatalogRegistry, ValidationCatalog};
pub use error::{AbortError, FailError, ValidatorError};
pub use outcome::{ValidationOutcome, ValidationReport};
pub use validator::{Validator, classify};
