use crate::error::SourceError;
use crate::responses::{ApiErrorResponse, GamesResponse, StandingsResponse};
use crate::{FetchParams, StatsSource};
use async_trait::async_trait;
use chrono::{Datelike, Utc};
use configuration::SourceConfig;
use core_types::{Table, Value};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Squiggle marks a finished game with `complete: 100`.
const COMPLETE: i64 = 100;

/// A client for the public Squiggle AFL API (<https://api.squiggle.com.au>).
#[derive(Clone)]
pub struct SquiggleClient {
    client: reqwest::Client,
    base_url: String,
}

impl SquiggleClient {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        query: &str,
        params: &FetchParams,
    ) -> Result<T, SourceError> {
        let season = params.season.unwrap_or_else(|| Utc::now().year());
        let mut pairs = vec![("q", query.to_string()), ("year", season.to_string())];
        if let Some(round) = params.round {
            pairs.push(("round", round.to_string()));
        }

        tracing::debug!(query, season, round = ?params.round, "Requesting Squiggle data.");
        let response = self.client.get(&self.base_url).query(&pairs).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str::<T>(&text).map_err(|e| SourceError::Deserialization(e.to_string()))
        } else {
            let body = serde_json::from_str::<ApiErrorResponse>(&text)
                .map(|e| e.error)
                .unwrap_or(text);
            Err(SourceError::ApiError {
                status: status.as_u16(),
                body,
            })
        }
    }

    async fn games(&self, params: &FetchParams) -> Result<Table, SourceError> {
        let response: GamesResponse = self.get("games", params).await?;
        let mut table = Table::from_json_records(&response.games);
        if let Some(team) = &params.team {
            retain_matching(&mut table, &["hteam", "ateam"], team);
        }
        Ok(table)
    }
}

/// Keeps rows where any of `columns` equals `team`, ignoring case.
fn retain_matching(table: &mut Table, columns: &[&str], team: &str) {
    table.retain_rows(|names, row| {
        names.iter().zip(row).any(|(name, value)| {
            columns.contains(&name.as_str())
                && matches!(value, Value::Text(t) if t.eq_ignore_ascii_case(team))
        })
    });
}

#[async_trait]
impl StatsSource for SquiggleClient {
    fn name(&self) -> &str {
        "squiggle"
    }

    async fn fetch_results(&self, params: &FetchParams) -> Result<Table, SourceError> {
        let mut table = self.games(params).await?;
        // An unplayed round comes back as `{"games":[]}`, with no columns at all.
        if table.is_empty() {
            tracing::info!(rows = 0, "Fetched results.");
            return Ok(table);
        }
        let complete = table
            .column_index("complete")
            .ok_or_else(|| SourceError::InvalidData("games are missing the 'complete' field".to_string()))?;
        table.retain_rows(|_, row| row[complete] == Value::Int(COMPLETE));
        tracing::info!(rows = table.shape().0, "Fetched results.");
        Ok(table)
    }

    async fn fetch_fixture(&self, params: &FetchParams) -> Result<Table, SourceError> {
        let table = self.games(params).await?;
        tracing::info!(rows = table.shape().0, "Fetched fixture.");
        Ok(table)
    }

    async fn fetch_ladder(&self, params: &FetchParams) -> Result<Table, SourceError> {
        let response: StandingsResponse = self.get("standings", params).await?;
        let mut table = Table::from_json_records(&response.standings);
        if let Some(team) = &params.team {
            retain_matching(&mut table, &["name"], team);
        }
        tracing::info!(rows = table.shape().0, "Fetched ladder.");
        Ok(table)
    }
}
