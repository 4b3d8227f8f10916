//! Core data types for the score store
//!
//! - `Player`: a manager entered in the league, tagged with a team label
//! - `Score`: one player's result for one gameweek, with derived totals
//! - `ScoreEntry` / `ScoreUpdate`: write-side inputs, validated before use
//! - `ScoreFilter`: optional narrowing for score listings

use crate::storage::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Gameweeks in a Premier League season
pub const MAX_GAMEWEEK: i64 = 38;

/// Upper bound on a single week's points or transfer cost
pub const MAX_WEEK_POINTS: i64 = 1000;

/// Longest accepted player name or team label
pub const MAX_LABEL_LEN: usize = 100;

/// A player record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub id: i64,
    pub name: String,
    /// Team label used to group players on the dashboard
    pub team: String,
    pub created_at: DateTime<Utc>,
}

/// Input for creating or editing a player
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlayer {
    pub name: String,
    pub team: String,
}

impl NewPlayer {
    pub fn new(name: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            team: team.into(),
        }
    }

    /// Trim both labels and reject empty or oversized values
    pub fn normalized(&self) -> StorageResult<NewPlayer> {
        Ok(NewPlayer {
            name: validate_label("name", &self.name)?,
            team: validate_label("team", &self.team)?,
        })
    }
}

fn validate_label(field: &str, value: &str) -> StorageResult<String> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        return Err(StorageError::Validation(format!(
            "Player {} cannot be empty",
            field
        )));
    }

    if trimmed.chars().count() > MAX_LABEL_LEN {
        return Err(StorageError::Validation(format!(
            "Player {} exceeds maximum length of {} characters",
            field, MAX_LABEL_LEN
        )));
    }

    Ok(trimmed.to_string())
}

/// A score row joined with its player
///
/// `net_points` and `overall_points` are derived at query time and never
/// stored. `overall_points` is the player's running net total up to and
/// including this gameweek.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Score {
    pub id: i64,
    pub player_id: i64,
    pub player_name: String,
    pub team: String,
    pub gameweek: i64,
    pub week_points: i64,
    /// Transfer-hit deduction for the week
    pub week_cost: i64,
    pub net_points: i64,
    pub overall_points: i64,
}

/// One row of a bulk gameweek submission
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntry {
    pub player_id: i64,
    pub week_points: i64,
    #[serde(default)]
    pub week_cost: i64,
}

impl ScoreEntry {
    pub fn new(player_id: i64, week_points: i64, week_cost: i64) -> Self {
        Self {
            player_id,
            week_points,
            week_cost,
        }
    }

    pub fn validate(&self) -> StorageResult<()> {
        validate_points(self.week_points, self.week_cost)
    }
}

/// Full replacement of a score's editable fields
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreUpdate {
    pub player_id: i64,
    pub gameweek: i64,
    pub week_points: i64,
    pub week_cost: i64,
}

impl ScoreUpdate {
    pub fn validate(&self) -> StorageResult<()> {
        validate_gameweek(self.gameweek)?;
        validate_points(self.week_points, self.week_cost)
    }
}

/// Check a gameweek number against the season length
pub fn validate_gameweek(gameweek: i64) -> StorageResult<()> {
    if !(1..=MAX_GAMEWEEK).contains(&gameweek) {
        return Err(StorageError::Validation(format!(
            "Gameweek must be between 1 and {}, got {}",
            MAX_GAMEWEEK, gameweek
        )));
    }
    Ok(())
}

fn validate_points(week_points: i64, week_cost: i64) -> StorageResult<()> {
    if week_points < 0 {
        return Err(StorageError::Validation(
            "Week points cannot be negative".to_string(),
        ));
    }
    if week_cost < 0 {
        return Err(StorageError::Validation(
            "Week cost cannot be negative".to_string(),
        ));
    }
    if week_points > MAX_WEEK_POINTS || week_cost > MAX_WEEK_POINTS {
        return Err(StorageError::Validation(format!(
            "Week points and cost must be at most {}",
            MAX_WEEK_POINTS
        )));
    }
    Ok(())
}

/// Optional filters for listing scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreFilter {
    pub player_id: Option<i64>,
    pub gameweek: Option<i64>,
}

impl ScoreFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn player(mut self, player_id: i64) -> Self {
        self.player_id = Some(player_id);
        self
    }

    pub fn gameweek(mut self, gameweek: i64) -> Self {
        self.gameweek = Some(gameweek);
        self
    }
}

/// What a bulk submission did
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct BulkOutcome {
    pub created: usize,
    pub updated: usize,
}

impl BulkOutcome {
    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

/// Row counts, reported by the health endpoint
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    pub players: usize,
    pub scores: usize,
    pub max_gameweek: Option<i64>,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} players, {} scores", self.players, self.scores)?;
        if let Some(gw) = self.max_gameweek {
            write!(f, ", up to gameweek {}", gw)?;
        }
        Ok(())
    }
}
