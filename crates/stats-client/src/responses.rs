use serde::Deserialize;
use serde_json::Value as JsonValue;

// Squiggle wraps every answer in an object keyed by the query name. Records are
// kept as raw JSON so new fields flow through to tables without code changes.

/// The response to `?q=games`.
#[derive(Debug, Clone, Deserialize)]
pub struct GamesResponse {
    pub games: Vec<JsonValue>,
}

/// The response to `?q=standings`.
#[derive(Debug, Clone, Deserialize)]
pub struct StandingsResponse {
    pub standings: Vec<JsonValue>,
}

/// The body Squiggle sends alongside a non-2xx status, when it sends JSON at all.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}
