use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The response policy applied when a validation query returns rows.
///
/// Ordered from least to most severe, so `Severity::Abort > Severity::Fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Disabled. The query is never executed.
    Off,
    /// Offending rows are logged, the run still succeeds.
    Skip,
    /// Offending rows fail the run with a reportable error.
    Fail,
    /// Offending rows fail the run and the enclosing pipeline must halt.
    Abort,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Off => "OFF",
            Severity::Skip => "SKIP",
            Severity::Fail => "FAIL",
            Severity::Abort => "ABORT",
        }
    }

    /// Every severity except `Off` causes the validation to run.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Severity::Off)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFF" => Ok(Severity::Off),
            "SKIP" => Ok(Severity::Skip),
            "FAIL" => Ok(Severity::Fail),
            "ABORT" => Ok(Severity::Abort),
            other => Err(CoreError::InvalidInput(
                "severity".to_string(),
                format!("'{}' is not one of OFF, SKIP, FAIL, ABORT", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("abort".parse::<Severity>().unwrap(), Severity::Abort);
        assert_eq!(" Skip ".parse::<Severity>().unwrap(), Severity::Skip);
        assert_eq!("FAIL".parse::<Severity>().unwrap(), Severity::Fail);
        assert!("WARN".parse::<Severity>().is_err());
    }

    #[test]
    fn off_is_the_only_disabled_severity() {
        assert!(!Severity::Off.is_enabled());
        assert!(Severity::Skip.is_enabled());
        assert!(Severity::Fail.is_enabled());
        assert!(Severity::Abort.is_enabled());
    }

    #[test]
    fn severities_are_ordered_by_escalation() {
        assert!(Severity::Abort > Severity::Fail);
        assert!(Severity::Fail > Severity::Skip);
        assert!(Severity::Skip > Severity::Off);
    }

    #[test]
    fn serde_uses_uppercase_names() {
        let json = serde_json::to_string(&Severity::Abort).unwrap();
        assert_eq!(json, "\"ABORT\"");
        let parsed: Severity = serde_json::from_str("\"SKIP\"").unwrap();
        assert_eq!(parsed, Severity::Skip);
    }
}
