//! Data Transfer Objects
//!
//! Request and response types for the API endpoints. JSON bodies and
//! URL-encoded form bodies both deserialize into these.

use serde::{Deserialize, Serialize};

use crate::standings::{ChartData, TeamStanding};
use crate::storage::{Player, Score, ScoreEntry};

// ============================================
// PLAYER DTOs
// ============================================

/// Player list query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PlayerListParams {
    /// Only players carrying this team label
    #[serde(default)]
    pub team: Option<String>,
}

/// List players response
#[derive(Debug, Serialize)]
pub struct PlayerListResponse {
    pub players: Vec<Player>,
    pub total: usize,
}

// ============================================
// SCORE DTOs
// ============================================

/// Score list query parameters.
///
/// Kept as strings: blank or non-numeric values are ignored rather than
/// rejected, so an empty filter form still lists everything.
#[derive(Debug, Default, Deserialize)]
pub struct ScoreListParams {
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub gameweek: Option<String>,
}

/// List scores response
#[derive(Debug, Serialize)]
pub struct ScoreListResponse {
    pub scores: Vec<Score>,
    pub total: usize,
    /// Highest gameweek with any score, 0 when empty (ignores filters)
    pub max_gameweek: i64,
    /// Suggested gameweek for the next bulk entry
    pub next_gameweek: i64,
    /// Filters that were actually applied
    pub player_id: Option<i64>,
    pub gameweek: Option<i64>,
}

/// Bulk score entry request (JSON)
#[derive(Debug, Deserialize)]
pub struct BulkScoreRequest {
    pub gameweek: i64,
    pub entries: Vec<ScoreEntry>,
}

/// Bulk score entry response
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkScoreResponse {
    pub gameweek: i64,
    pub created: usize,
    pub updated: usize,
}

// ============================================
// DASHBOARD DTOs
// ============================================

/// Everything the dashboard page renders
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub weekly: ChartData,
    pub overall: ChartData,
    pub standings: Vec<TeamStanding>,
}

/// League table response
#[derive(Debug, Serialize)]
pub struct StandingsResponse {
    pub standings: Vec<TeamStanding>,
    pub max_gameweek: i64,
}

// ============================================
// AUTH DTOs
// ============================================

/// Who the browser is currently authenticated as
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub is_admin: bool,
    pub current_user: Option<String>,
    pub realm: String,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, unhealthy
    pub status: String,
    /// Database status
    pub database: String,
    pub players: usize,
    pub scores: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
