use crate::enums::Severity;
use serde::{Deserialize, Serialize};

/// One named data check.
///
/// The query is written so that it returns the offending records: an empty
/// result means the data passed, any row means it did not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationDefinition {
    pub name: String,
    pub query: String,
    pub severity: Severity,
}

impl ValidationDefinition {
    pub fn new(name: impl Into<String>, query: impl Into<String>, severity: Severity) -> Self {
        Self {
            name: name.into(),
            query: query.into(),
            severity,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.severity.is_enabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_from_plain_records() {
        let def: ValidationDefinition = serde_json::from_str(
            r#"{"name":"no_nulls","query":"SELECT id FROM t WHERE v IS NULL","severity":"FAIL"}"#,
        )
        .unwrap();
        assert_eq!(def.name, "no_nulls");
        assert_eq!(def.severity, Severity::Fail);
        assert!(def.is_enabled());
    }
}
