use core_types::{Row, Severity, ValidationDefinition, render_rows};

/// A validation whose query returned rows, together with those rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub definition: ValidationDefinition,
    pub rows: Vec<Row>,
}

impl ValidationOutcome {
    pub fn new(definition: ValidationDefinition, rows: Vec<Row>) -> Self {
        Self { definition, rows }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn severity(&self) -> Severity {
        self.definition.severity
    }

    /// `name returned [(..), (..)]`
    pub fn describe(&self) -> String {
        format!("{} returned {}", self.name(), render_rows(&self.rows))
    }
}

/// What a run that did not fail looked like.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// How many validations were executed.
    pub evaluated: usize,
    /// SKIP validations that returned rows.
    pub skipped: Vec<ValidationOutcome>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

pub(crate) fn names(outcomes: &[ValidationOutcome]) -> Vec<&str> {
    outcomes.iter().map(ValidationOutcome::name).collect()
}

pub(crate) fn describe_outcomes(outcomes: &[ValidationOutcome]) -> String {
    outcomes
        .iter()
        .map(ValidationOutcome::describe)
        .collect::<Vec<_>>()
        .join("; ")
}
