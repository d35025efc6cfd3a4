use crate::error::ValidatorError;
use core_types::{Severity, ValidationDefinition};
use std::collections::{BTreeMap, HashSet};

/// An ordered, named set of validations.
///
/// Built once and read-only afterwards. Names are unique within a catalog so
/// log lines and error messages identify exactly one check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationCatalog {
    name: String,
    definitions: Vec<ValidationDefinition>,
}

impl ValidationCatalog {
    pub fn new(
        name: impl Into<String>,
        definitions: Vec<ValidationDefinition>,
    ) -> Result<Self, ValidatorError> {
        let name = name.into();
        let mut seen = HashSet::new();
        for def in &definitions {
            if !seen.insert(def.name.as_str()) {
                return Err(ValidatorError::DuplicateValidation {
                    catalog: name,
                    name: def.name.clone(),
                });
            }
        }
        Ok(Self { name, definitions })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definitions(&self) -> &[ValidationDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Catalogs by key. Selecting a catalog is a plain lookup.
#[derive(Debug, Clone, Default)]
pub struct CatalogRegistry {
    catalogs: BTreeMap<String, ValidationCatalog>,
}

impl CatalogRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the catalogs that ship with the application.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(squiggle_catalog());
        registry
    }

    /// Adds a catalog under its own name, returning any catalog it replaced.
    pub fn register(&mut self, catalog: ValidationCatalog) -> Option<ValidationCatalog> {
        self.catalogs.insert(catalog.name().to_string(), catalog)
    }

    /// Registers every catalog declared in the configuration file. A configured
    /// catalog replaces a built-in one with the same key.
    pub fn with_configured(
        mut self,
        configured: &BTreeMap<String, Vec<ValidationDefinition>>,
    ) -> Result<Self, ValidatorError> {
        for (key, definitions) in configured {
            if let Some(replaced) = self.register(ValidationCatalog::new(key, definitions.clone())?) {
                tracing::info!(catalog = %replaced.name(), "Configured catalog replaces the built-in one.");
            }
        }
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Result<ValidationCatalog, ValidatorError> {
        self.catalogs
            .get(key)
            .cloned()
            .ok_or_else(|| ValidatorError::CatalogNotFound(key.to_string()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }
}

// Checks over the tables `kickstat fetch --save` writes from Squiggle data.
// Column names are Squiggle's field names.
const SQUIGGLE_CHECKS: &[(&str, &str, Severity)] = &[
    (
        "results_duplicate_games",
        "SELECT id, COUNT(*) AS copies FROM results GROUP BY id HAVING COUNT(*) > 1",
        Severity::Abort,
    ),
    (
        "results_team_plays_itself",
        "SELECT id, hteam, ateam FROM results WHERE hteam = ateam",
        Severity::Abort,
    ),
    (
        "results_missing_scores",
        "SELECT id, hteam, ateam FROM results WHERE hscore IS NULL OR ascore IS NULL",
        Severity::Fail,
    ),
    (
        "results_score_breakdown",
        "SELECT id, hscore, hgoals, hbehinds, ascore, agoals, abehinds FROM results \
         WHERE hscore <> hgoals * 6 + hbehinds OR ascore <> agoals * 6 + abehinds",
        Severity::Fail,
    ),
    (
        "results_winner_mismatch",
        "SELECT id, hteam, ateam, winner FROM results \
         WHERE (hscore > ascore AND winner IS DISTINCT FROM hteam) \
            OR (ascore > hscore AND winner IS DISTINCT FROM ateam)",
        Severity::Fail,
    ),
    (
        "fixture_missing_venue",
        "SELECT id, hteam, ateam FROM fixture WHERE venue IS NULL OR venue = ''",
        Severity::Skip,
    ),
    (
        "ladder_duplicate_ranks",
        "SELECT rank, COUNT(*) AS teams FROM ladder GROUP BY rank HAVING COUNT(*) > 1",
        Severity::Fail,
    ),
    (
        "ladder_points_mismatch",
        "SELECT name, pts, wins, draws FROM ladder WHERE pts <> wins * 4 + draws * 2",
        Severity::Skip,
    ),
    (
        "ladder_percentage_rounding",
        "SELECT name, percentage FROM ladder \
         WHERE ABS(percentage - 100.0 * \"for\" / NULLIF(against, 0)) > 0.1",
        Severity::Off,
    ),
];

fn squiggle_catalog() -> ValidationCatalog {
    ValidationCatalog {
        name: "squiggle".to_string(),
        definitions: SQUIGGLE_CHECKS
            .iter()
            .map(|(name, query, severity)| ValidationDefinition::new(*name, *query, *severity))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(name: &str, severity: Severity) -> ValidationDefinition {
        ValidationDefinition::new(name, format!("SELECT 1 AS {}", name), severity)
    }

    #[test]
    fn catalogs_reject_duplicate_names() {
        let err = ValidationCatalog::new(
            "nightly",
            vec![def("a", Severity::Fail), def("b", Severity::Skip), def("a", Severity::Abort)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ValidatorError::DuplicateValidation { ref catalog, ref name } if catalog == "nightly" && name == "a"
        ));
    }

    #[test]
    fn builtin_registry_resolves_squiggle_by_key() {
        let registry = CatalogRegistry::builtin();
        let catalog = registry.get("squiggle").unwrap();
        assert_eq!(catalog.name(), "squiggle");
        assert_eq!(catalog.len(), SQUIGGLE_CHECKS.len());
        assert_eq!(catalog.definitions()[0].name, "results_duplicate_games");
        assert!(matches!(
            registry.get("nope"),
            Err(ValidatorError::CatalogNotFound(key)) if key == "nope"
        ));
    }

    #[test]
    fn builtin_catalog_names_are_unique() {
        let catalog = squiggle_catalog();
        assert!(ValidationCatalog::new("copy", catalog.definitions().to_vec()).is_ok());
    }

    #[test]
    fn configured_catalogs_are_added_and_override_builtins() {
        let mut configured = BTreeMap::new();
        configured.insert("nightly".to_string(), vec![def("no_nulls", Severity::Fail)]);
        configured.insert("squiggle".to_string(), vec![def("only_one", Severity::Skip)]);

        let registry = CatalogRegistry::builtin().with_configured(&configured).unwrap();
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["nightly", "squiggle"]);
        assert_eq!(registry.get("squiggle").unwrap().len(), 1);
        assert_eq!(registry.get("nightly").unwrap().definitions()[0].name, "no_nulls");
    }
}
