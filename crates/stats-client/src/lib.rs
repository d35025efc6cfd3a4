use crate::error::SourceError;
use async_trait::async_trait;
use configuration::SourceConfig;
use core_types::Table;
use std::fmt;
use std::str::FromStr;

pub mod error;
pub mod responses;
pub mod squiggle;
// --- Public API ---
pub use squiggle::SquiggleClient;

/// The datasets a statistics source can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Results,
    Fixture,
    Ladder,
    Lineup,
    PlayerStats,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Results => "results",
            Dataset::Fixture => "fixture",
            Dataset::Ladder => "ladder",
            Dataset::Lineup => "lineup",
            Dataset::PlayerStats => "player-stats",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "results" => Ok(Dataset::Results),
            "fixture" => Ok(Dataset::Fixture),
            "ladder" => Ok(Dataset::Ladder),
            "lineup" => Ok(Dataset::Lineup),
            "player-stats" => Ok(Dataset::PlayerStats),
            other => Err(SourceError::InvalidData(format!("unknown dataset '{}'", other))),
        }
    }
}

/// Narrows a fetch to one season, round or team. Unset fields mean "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchParams {
    pub season: Option<i32>,
    pub round: Option<i32>,
    pub team: Option<String>,
}

impl FetchParams {
    pub fn season(season: i32) -> Self {
        Self {
            season: Some(season),
            ..Self::default()
        }
    }

    pub fn round(mut self, round: i32) -> Self {
        self.round = Some(round);
        self
    }

    pub fn team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }
}

/// The generic interface for a sports statistics source.
///
/// Every dataset comes back as a `Table`. Sources that cannot provide a dataset
/// leave the default implementation in place, which reports it as unsupported.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// The name the source is registered under.
    fn name(&self) -> &str;

    /// Completed matches.
    async fn fetch_results(&self, params: &FetchParams) -> Result<Table, SourceError>;

    /// Scheduled matches, played or not.
    async fn fetch_fixture(&self, params: &FetchParams) -> Result<Table, SourceError>;

    /// Team standings.
    async fn fetch_ladder(&self, params: &FetchParams) -> Result<Table, SourceError>;

    /// Named team lineups.
    async fn fetch_lineup(&self, _params: &FetchParams) -> Result<Table, SourceError> {
        Err(self.unsupported(Dataset::Lineup))
    }

    /// Per-player match statistics.
    async fn fetch_player_stats(&self, _params: &FetchParams) -> Result<Table, SourceError> {
        Err(self.unsupported(Dataset::PlayerStats))
    }

    /// Dispatches to the fetch method for `dataset`.
    async fn fetch(&self, dataset: Dataset, params: &FetchParams) -> Result<Table, SourceError> {
        match dataset {
            Dataset::Results => self.fetch_results(params).await,
            Dataset::Fixture => self.fetch_fixture(params).await,
            Dataset::Ladder => self.fetch_ladder(params).await,
            Dataset::Lineup => self.fetch_lineup(params).await,
            Dataset::PlayerStats => self.fetch_player_stats(params).await,
        }
    }

    fn unsupported(&self, dataset: Dataset) -> SourceError {
        SourceError::UnsupportedDataset {
            source_name: self.name().to_string(),
            dataset,
        }
    }
}

/// Creates the statistics source named in the configuration.
pub fn create_source(config: &SourceConfig) -> Result<Box<dyn StatsSource>, SourceError> {
    match config.name.to_ascii_lowercase().as_str() {
        "squiggle" => Ok(Box::new(SquiggleClient::new(config)?)),
        other => Err(SourceError::SourceNotFound(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datasets_parse_from_cli_spellings() {
        assert_eq!("results".parse::<Dataset>().unwrap(), Dataset::Results);
        assert_eq!("player_stats".parse::<Dataset>().unwrap(), Dataset::PlayerStats);
        assert_eq!("Player-Stats".parse::<Dataset>().unwrap(), Dataset::PlayerStats);
        assert!("odds".parse::<Dataset>().is_err());
    }

    #[test]
    fn factory_knows_squiggle_only() {
        let config = SourceConfig::default();
        let source = create_source(&config).unwrap();
        assert_eq!(source.name(), "squiggle");

        let unknown = SourceConfig {
            name: "footywire".to_string(),
            ..SourceConfig::default()
        };
        match create_source(&unknown) {
            Err(SourceError::SourceNotFound(name)) => assert_eq!(name, "footywire"),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("footywire should not resolve"),
        }
    }

    #[test]
    fn params_builder_sets_every_field() {
        let params = FetchParams::season(2020).round(3).team("Geelong");
        assert_eq!(params.season, Some(2020));
        assert_eq!(params.round, Some(3));
        assert_eq!(params.team.as_deref(), Some("Geelong"));
    }
}
