//! Score Routes
//!
//! JSON endpoints:
//! - GET /api/scores - List scores (`?player_id=&gameweek=`)
//! - GET /api/scores/:id - Get a score
//! - POST /api/scores/bulk - Enter a whole gameweek (admin)
//! - PUT /api/scores/:id - Update a score (admin)
//! - DELETE /api/scores/:id - Delete a score (admin)
//!
//! Form endpoints used by the scores page (admin, redirect back):
//! - POST /scores - Bulk entry with `week_points_<id>` / `week_cost_<id>` fields
//! - POST /scores/:id, POST /scores/:id/delete, DELETE /scores/:id

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Form, Json,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::auth::AdminUser;
use crate::api::dto::{BulkScoreRequest, BulkScoreResponse, ScoreListParams, ScoreListResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::{Player, Score, ScoreEntry, ScoreFilter, ScoreUpdate, MAX_GAMEWEEK};

const SCORES_PAGE: &str = "/scores";

/// Gameweek used when the bulk form omits one
const DEFAULT_GAMEWEEK: i64 = 1;

/// GET /api/scores
pub async fn list_scores(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScoreListParams>,
) -> ApiResult<Json<ScoreListResponse>> {
    let filter = ScoreFilter {
        player_id: lenient_int(params.player_id.as_deref()),
        gameweek: lenient_int(params.gameweek.as_deref()),
    };

    let scores = state.store.list_scores(&filter).await?;
    let max_gameweek = state.store.max_gameweek().await?.unwrap_or(0);

    Ok(Json(ScoreListResponse {
        total: scores.len(),
        scores,
        max_gameweek,
        next_gameweek: next_gameweek(max_gameweek),
        player_id: filter.player_id,
        gameweek: filter.gameweek,
    }))
}

/// GET /api/scores/:id
pub async fn get_score(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Score>> {
    state
        .store
        .get_score(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Score {} not found", id)))
}

/// POST /api/scores/bulk
pub async fn bulk_scores(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<BulkScoreRequest>,
) -> ApiResult<Json<BulkScoreResponse>> {
    if req.entries.is_empty() {
        return Err(ApiError::Validation("No score entries submitted".to_string()));
    }

    let outcome = state.store.upsert_scores(req.gameweek, &req.entries).await?;

    Ok(Json(BulkScoreResponse {
        gameweek: req.gameweek,
        created: outcome.created,
        updated: outcome.updated,
    }))
}

/// PUT /api/scores/:id
pub async fn update_score(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(update): Json<ScoreUpdate>,
) -> ApiResult<Json<Score>> {
    let score = state.store.update_score(id, update).await?;
    Ok(Json(score))
}

/// DELETE /api/scores/:id
pub async fn delete_score(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.store.delete_score(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /scores
///
/// One form row per player; rows with either field blank are skipped.
pub async fn bulk_scores_form(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Form(form): Form<HashMap<String, String>>,
) -> ApiResult<Redirect> {
    let players = state.store.list_players(None).await?;
    let submission = parse_bulk_form(&form, &players)?;

    let outcome = state
        .store
        .upsert_scores(submission.gameweek, &submission.entries)
        .await?;

    tracing::debug!(
        gameweek = submission.gameweek,
        saved = outcome.total(),
        skipped = submission.skipped,
        "Processed bulk score form"
    );

    Ok(Redirect::to(SCORES_PAGE))
}

/// POST /scores/:id
pub async fn update_score_form(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Form(update): Form<ScoreUpdate>,
) -> ApiResult<Redirect> {
    state.store.update_score(id, update).await?;
    Ok(Redirect::to(SCORES_PAGE))
}

/// POST /scores/:id/delete and DELETE /scores/:id
pub async fn delete_score_form(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    state.store.delete_score(id).await?;
    Ok(Redirect::to(SCORES_PAGE))
}

/// A bulk form decoded against the current player list
#[derive(Debug, PartialEq)]
pub struct BulkSubmission {
    pub gameweek: i64,
    pub entries: Vec<ScoreEntry>,
    pub skipped: usize,
}

/// Decode a bulk entry form.
///
/// Expects `gameweek` plus `week_points_<player_id>` and
/// `week_cost_<player_id>` for each known player. Fields for unknown
/// players are ignored; a present but non-numeric value is an error.
pub fn parse_bulk_form(
    form: &HashMap<String, String>,
    players: &[Player],
) -> ApiResult<BulkSubmission> {
    let gameweek = match non_blank(form.get("gameweek")) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::Validation(format!("Invalid gameweek: {:?}", raw)))?,
        None => DEFAULT_GAMEWEEK,
    };

    let mut entries = Vec::new();
    let mut skipped = 0;

    for player in players {
        let points = non_blank(form.get(&format!("week_points_{}", player.id)));
        let cost = non_blank(form.get(&format!("week_cost_{}", player.id)));

        let (points, cost) = match (points, cost) {
            (Some(points), Some(cost)) => (points, cost),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let week_points = points.parse().map_err(|_| {
            ApiError::Validation(format!("Invalid week points for {}: {:?}", player.name, points))
        })?;
        let week_cost = cost.parse().map_err(|_| {
            ApiError::Validation(format!("Invalid week cost for {}: {:?}", player.name, cost))
        })?;

        entries.push(ScoreEntry::new(player.id, week_points, week_cost));
    }

    Ok(BulkSubmission {
        gameweek,
        entries,
        skipped,
    })
}

/// Suggested gameweek for the next entry, capped at the season length
pub fn next_gameweek(max_gameweek: i64) -> i64 {
    (max_gameweek + 1).min(MAX_GAMEWEEK)
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn lenient_int(value: Option<&str>) -> Option<i64> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
}
