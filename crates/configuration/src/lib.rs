use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_logging;
pub use settings::{
    Config, Credentials, DatabaseSettings, LoggingConfig, SourceConfig, ValidationConfig,
};

/// Environment variables with this prefix override file values, with `__`
/// separating nested keys: `KICKSTAT_CREDENTIALS__PASSWORD=...`.
pub const ENV_PREFIX: &str = "KICKSTAT";

/// The section credentials are read from unless another one is asked for.
pub const DEFAULT_SECTION: &str = "credentials";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Loads the application configuration from `path`.
///
/// The file format is taken from the extension (`.ini` or `.toml`). Environment
/// overrides are applied on top, then the result is deserialized into our
/// strongly-typed `Config` struct and checked for obviously broken values.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    load_config_with_section(path, DEFAULT_SECTION)
}

/// Like `load_config`, but takes the database credentials from `section`.
///
/// The file does not need a `[credentials]` section when another one is named.
pub fn load_config_with_section(path: impl AsRef<Path>, section: &str) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let mut config = builder(path)?.try_deserialize::<Config>()?;
    if section != DEFAULT_SECTION {
        config.credentials = load_credentials(path, section)?;
    }
    validate(&config)?;
    Ok(config)
}

/// Reads a single named section of the file as database credentials.
///
/// Lets one file hold several sets of credentials (`[credentials]`,
/// `[credentials_staging]`, ...) and pick between them at runtime.
pub fn load_credentials(
    path: impl AsRef<Path>,
    section: &str,
) -> Result<settings::Credentials, ConfigError> {
    let built = builder(path.as_ref())?;
    let credentials = match built.get::<settings::Credentials>(section) {
        Ok(credentials) => credentials,
        Err(config::ConfigError::NotFound(_)) => {
            return Err(ConfigError::SectionNotFound(section.to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    validate_credentials(&credentials)?;
    Ok(credentials)
}

fn builder(path: &Path) -> Result<config::Config, ConfigError> {
    let built = config::Config::builder()
        .add_source(config::File::from(path).required(true))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    Ok(built)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_credentials(&config.credentials)?;

    if config.database.max_connections == 0 {
        return Err(ConfigError::ValidationError(
            "database.max_connections must be at least 1".to_string(),
        ));
    }

    let level = config.logging.level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "logging.level '{}' is not one of {:?}",
            config.logging.level, LOG_LEVELS
        )));
    }

    for (key, definitions) in &config.validation.catalogs {
        for def in definitions {
            if def.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "catalog '{}' has a validation with an empty name",
                    key
                )));
            }
            if def.query.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "validation '{}' in catalog '{}' has an empty query",
                    def.name, key
                )));
            }
        }
    }

    Ok(())
}

fn validate_credentials(credentials: &settings::Credentials) -> Result<(), ConfigError> {
    for (field, value) in [
        ("user", &credentials.user),
        ("host", &credentials.host),
        ("dbname", &credentials.dbname),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "credentials.{} must not be empty",
                field
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Severity;
    use std::io::Write;
    use tempfile::Builder;

    fn write_config(extension: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new()
            .suffix(&format!(".{}", extension))
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_ini_credentials_with_defaults() {
        let file = write_config(
            "ini",
            "[credentials]\nuser = footy\npassword = secret\nhost = localhost\nport = 5433\ndbname = afl\n",
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.credentials.user, "footy");
        assert_eq!(config.credentials.port, 5433);
        assert_eq!(config.credentials.label(), "afl");
        assert_eq!(config.logging.max_files, 7);
        assert_eq!(config.source.name, "squiggle");
        assert_eq!(config.validation.catalog, "squiggle");
    }

    #[test]
    fn loads_toml_with_validation_catalogs() {
        let file = write_config(
            "toml",
            r#"
[credentials]
user = "footy"
host = "db"
dbname = "afl"
db = "warehouse"

[logging]
level = "debug"

[validation]
catalog = "nightly"
query_timeout_secs = 30

[[validation.catalogs.nightly]]
name = "no_nulls"
query = "SELECT id FROM t WHERE v IS NULL"
severity = "FAIL"

[[validation.catalogs.nightly]]
name = "pk_dupes"
query = "SELECT id FROM t GROUP BY id HAVING COUNT(*) > 1"
severity = "ABORT"
"#,
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.credentials.port, 5432);
        assert_eq!(config.credentials.label(), "warehouse");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.stdout);
        assert_eq!(config.validation.query_timeout_secs, Some(30));
        let nightly = &config.validation.catalogs["nightly"];
        assert_eq!(nightly.len(), 2);
        assert_eq!(nightly[1].severity, Severity::Abort);
    }

    #[test]
    fn picks_a_named_credentials_section() {
        let file = write_config(
            "ini",
            "[credentials]\nuser = a\nhost = h1\ndbname = d1\n\n[staging]\nuser = b\nhost = h2\ndbname = d2\n",
        );
        let staging = load_credentials(file.path(), "staging").unwrap();
        assert_eq!(staging.user, "b");
        assert_eq!(staging.host, "h2");

        let missing = load_credentials(file.path(), "production").unwrap_err();
        assert!(matches!(missing, ConfigError::SectionNotFound(s) if s == "production"));
    }

    #[test]
    fn named_section_stands_in_for_missing_credentials() {
        let file = write_config(
            "ini",
            "[staging]\nuser = b\nhost = h2\ndbname = d2\n\n[logging]\nlevel = warn\n",
        );
        let config = load_config_with_section(file.path(), "staging").unwrap();
        assert_eq!(config.credentials.user, "b");
        assert_eq!(config.credentials.port, 5432);
        assert_eq!(config.logging.level, "warn");

        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("credentials.user")));
    }

    #[test]
    fn rejects_empty_credentials() {
        let file = write_config("ini", "[credentials]\nuser =\nhost = h\ndbname = d\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("user")));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let file = write_config(
            "toml",
            "[credentials]\nuser = \"u\"\nhost = \"h\"\ndbname = \"d\"\n[logging]\nlevel = \"loud\"\n",
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("loud")));
    }

    #[test]
    fn rejects_catalog_entries_without_a_query() {
        let file = write_config(
            "toml",
            r#"
[credentials]
user = "u"
host = "h"
dbname = "d"

[[validation.catalogs.broken]]
name = "empty"
query = "  "
severity = "SKIP"
"#,
        );
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(msg) if msg.contains("empty query")));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = load_config("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }
}
