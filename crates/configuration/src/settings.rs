use core_types::ValidationDefinition;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Filled from `[credentials]`, or from another section chosen at load time.
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
}

/// Login details for the PostgreSQL warehouse.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub user: String,
    #[serde(default)]
    pub password: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub dbname: String,
    /// A human-readable label for log messages. Falls back to `dbname`.
    #[serde(default)]
    pub db: Option<String>,
}

impl Credentials {
    pub fn label(&self) -> &str {
        self.db.as_deref().unwrap_or(&self.dbname)
    }
}

/// Connection pool tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory the rolling log files are written to.
    pub directory: PathBuf,
    pub file_prefix: String,
    /// A `tracing` level name (`trace`, `debug`, `info`, `warn`, `error`).
    pub level: String,
    /// How many rotated files to keep before the oldest is removed.
    pub max_files: usize,
    /// Also echo log lines to stdout.
    pub stdout: bool,
}

/// Which statistics source to fetch from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub name: String,
    pub base_url: String,
    /// Squiggle asks every client to identify itself with a contact address.
    pub user_agent: String,
    pub timeout_secs: u64,
}

/// Validation runs: which catalog to use and any catalogs declared in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub catalog: String,
    pub query_timeout_secs: Option<u64>,
    pub catalogs: BTreeMap<String, Vec<ValidationDefinition>>,
}

fn default_port() -> u16 {
    5432
}

// --- Default Implementations ---
// These allow a user to omit whole sections from their config file.

impl Default for Credentials {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            host: String::new(),
            port: default_port(),
            dbname: String::new(),
            db: None,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout_secs: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_prefix: "kickstat.log".to_string(),
            level: "info".to_string(),
            max_files: 7,
            stdout: true,
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            name: "squiggle".to_string(),
            base_url: "https://api.squiggle.com.au/".to_string(),
            user_agent: concat!("kickstat/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            catalog: "squiggle".to_string(),
            query_timeout_secs: None,
            catalogs: BTreeMap::new(),
        }
    }
}
