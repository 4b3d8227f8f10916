//! Dashboard Routes
//!
//! - GET /api/dashboard - Team chart series plus the league table
//! - GET /api/standings - League table only

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{DashboardResponse, StandingsResponse};
use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::standings::{build_charts, team_standings};
use crate::storage::ScoreFilter;

/// GET /api/dashboard
pub async fn dashboard(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardResponse>> {
    let scores = state.store.list_scores(&ScoreFilter::all()).await?;

    let charts = build_charts(&scores);
    let standings = team_standings(&scores);

    Ok(Json(DashboardResponse {
        weekly: charts.weekly,
        overall: charts.overall,
        standings,
    }))
}

/// GET /api/standings
pub async fn standings(State(state): State<Arc<AppState>>) -> ApiResult<Json<StandingsResponse>> {
    let scores = state.store.list_scores(&ScoreFilter::all()).await?;
    let max_gameweek = scores.iter().map(|s| s.gameweek).max().unwrap_or(0);

    Ok(Json(StandingsResponse {
        standings: team_standings(&scores),
        max_gameweek,
    }))
}
