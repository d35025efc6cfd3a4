use crate::catalog::ValidationCatalog;
use crate::error::{AbortError, FailError, ValidatorError};
use crate::outcome::{ValidationOutcome, ValidationReport, describe_outcomes, names};
use core_types::{Severity, ValidationDefinition, render_rows};
use database::{QueryExecutor, SessionFactory};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Runs a catalog of SQL checks and escalates by severity.
///
/// Every enabled check is executed inside one database session before any
/// outcome is classified, so a run always reports the complete picture.
pub struct Validator {
    sessions: Arc<dyn SessionFactory>,
    catalog: ValidationCatalog,
    query_timeout: Option<Duration>,
}

impl Validator {
    /// Stores the collaborators. No connection is opened until `run`.
    pub fn new(sessions: Arc<dyn SessionFactory>, catalog: ValidationCatalog) -> Self {
        Self {
            sessions,
            catalog,
            query_timeout: None,
        }
    }

    /// Bounds how long a single validation query may take.
    pub fn with_query_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &ValidationCatalog {
        &self.catalog
    }

    /// The catalog without its OFF entries, in catalog order.
    pub fn enabled_definitions(&self) -> Vec<&ValidationDefinition> {
        self.catalog
            .definitions()
            .iter()
            .filter(|def| {
                if !def.is_enabled() {
                    tracing::info!("Validation {} not enabled", def.name);
                }
                def.is_enabled()
            })
            .collect()
    }

    /// Executes every enabled validation, then classifies what returned rows.
    ///
    /// Returns `ValidatorError::Abort` if any ABORT check returned rows, otherwise
    /// `ValidatorError::Fail` if any FAIL check did. SKIP checks are only logged
    /// and show up in the report. A query that cannot be executed stops the run
    /// at once with `ValidatorError::Execution` or `ValidatorError::Timeout`.
    #[tracing::instrument(
        name = "validate",
        skip(self),
        fields(catalog = %self.catalog.name(), run_id = %Uuid::new_v4())
    )]
    pub async fn run(&self) -> Result<ValidationReport, ValidatorError> {
        let enabled = self.enabled_definitions();
        if enabled.is_empty() {
            tracing::info!("No validations enabled.");
            return Ok(ValidationReport::default());
        }

        let mut session = self.sessions.open().await.map_err(ValidatorError::Session)?;
        let collected = self.collect(session.as_mut(), &enabled).await;
        let closed = if collected.is_ok() {
            session.commit().await
        } else {
            session.rollback().await
        };

        let outcomes = match (collected, closed) {
            (Ok(outcomes), Ok(())) => outcomes,
            (Ok(_), Err(e)) => return Err(ValidatorError::Session(e)),
            (Err(e), Ok(())) => return Err(e),
            (Err(e), Err(rollback)) => {
                tracing::error!(error = %rollback, "Rollback failed after a validation error.");
                return Err(e);
            }
        };

        let skipped = classify(outcomes)?;
        tracing::info!(evaluated = enabled.len(), skipped = skipped.len(), "Validation complete.");
        Ok(ValidationReport {
            evaluated: enabled.len(),
            skipped,
        })
    }

    async fn collect(
        &self,
        session: &mut dyn QueryExecutor,
        enabled: &[&ValidationDefinition],
    ) -> Result<Vec<ValidationOutcome>, ValidatorError> {
        let mut outcomes = Vec::new();
        for def in enabled {
            tracing::info!("Validating {}", def.name);
            let fetched = match self.query_timeout {
                Some(timeout) => tokio::time::timeout(timeout, session.fetch_all(&def.query))
                    .await
                    .map_err(|_| ValidatorError::Timeout {
                        validation: def.name.clone(),
                        timeout,
                    })?,
                None => session.fetch_all(&def.query).await,
            };
            let rows = fetched.map_err(|source| ValidatorError::Execution {
                validation: def.name.clone(),
                source,
            })?;
            if !rows.is_empty() {
                outcomes.push(ValidationOutcome::new((*def).clone(), rows));
            }
        }
        Ok(outcomes)
    }
}

/// Sorts outcomes by severity and escalates.
///
/// ABORT wins over FAIL, FAIL over SKIP. Returns the SKIP outcomes when nothing
/// escalated. OFF outcomes are ignored.
pub fn classify(outcomes: Vec<ValidationOutcome>) -> Result<Vec<ValidationOutcome>, ValidatorError> {
    let mut aborts = Vec::new();
    let mut failures = Vec::new();
    let mut skips = Vec::new();
    for outcome in outcomes {
        match outcome.severity() {
            Severity::Abort => aborts.push(outcome),
            Severity::Fail => failures.push(outcome),
            Severity::Skip => skips.push(outcome),
            Severity::Off => {}
        }
    }

    if !aborts.is_empty() {
        for outcome in &aborts {
            tracing::error!(
                "AbortError: Failed critical validation check, Validation {} returned {}",
                outcome.name(),
                render_rows(&outcome.rows)
            );
        }
        return Err(AbortError { outcomes: aborts }.into());
    }

    if !failures.is_empty() {
        let err = FailError { outcomes: failures };
        tracing::error!("{}", err);
        return Err(err.into());
    }

    if !skips.is_empty() {
        tracing::info!(
            "{} validation skipped on validations {:?}. Validation returned: {}",
            skips.len(),
            names(&skips),
            describe_outcomes(&skips)
        );
    }
    Ok(skips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Value;

    fn outcome(name: &str, severity: Severity) -> ValidationOutcome {
        ValidationOutcome::new(
            ValidationDefinition::new(name, "SELECT 1", severity),
            vec![vec![Value::Int(1)]],
        )
    }

    #[test]
    fn nothing_to_classify_passes() {
        assert!(classify(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn abort_takes_precedence_and_keeps_every_abort() {
        let err = classify(vec![
            outcome("a", Severity::Fail),
            outcome("b", Severity::Abort),
            outcome("c", Severity::Skip),
            outcome("d", Severity::Abort),
        ])
        .unwrap_err();
        match err {
            ValidatorError::Abort(abort) => {
                assert_eq!(names(&abort.outcomes), vec!["b", "d"]);
                assert!(abort.to_string().starts_with("critical validation failed"));
            }
            other => panic!("expected abort, got {other}"),
        }
    }

    #[test]
    fn fail_message_counts_and_names_failures() {
        let err = classify(vec![outcome("x", Severity::Fail), outcome("y", Severity::Fail)]).unwrap_err();
        assert!(err.is_fail());
        let message = err.to_string();
        assert!(message.starts_with("2 validation failures"), "{message}");
        assert!(message.contains("\"x\"") && message.contains("\"y\""), "{message}");
        assert!(message.contains("x returned [(1)]"), "{message}");
    }

    #[test]
    fn skips_and_offs_never_fail() {
        let skipped = classify(vec![outcome("s", Severity::Skip), outcome("o", Severity::Off)]).unwrap();
        assert_eq!(names(&skipped), vec!["s"]);
    }
}
