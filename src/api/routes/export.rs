//! Export Routes
//!
//! - GET /api/export/scores.csv - Every score row, with derived totals

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::{Score, ScoreFilter};

const CSV_HEADER: [&str; 9] = [
    "id",
    "player_id",
    "player_name",
    "team",
    "gameweek",
    "week_points",
    "week_cost",
    "net_points",
    "overall_points",
];

/// GET /api/export/scores.csv
pub async fn export_scores_csv(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let scores = state.store.list_scores(&ScoreFilter::all()).await?;
    let body = scores_to_csv(&scores)?;

    tracing::info!(rows = scores.len(), "Exported scores");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"fpl-scores.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

/// Render scores as CSV. The header row is written even when empty.
pub fn scores_to_csv(scores: &[Score]) -> ApiResult<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER).map_err(csv_error)?;
    for score in scores {
        writer.serialize(score).map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV export failed: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| ApiError::Internal(format!("CSV export failed: {}", e)))
}

fn csv_error(e: csv::Error) -> ApiError {
    ApiError::Internal(format!("CSV export failed: {}", e))
}
