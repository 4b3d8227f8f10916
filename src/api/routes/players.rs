//! Player Routes
//!
//! JSON endpoints:
//! - GET /api/players - List players (optionally `?team=`)
//! - GET /api/players/:id - Get a player
//! - POST /api/players - Create a player (admin)
//! - PUT /api/players/:id - Update a player (admin)
//! - DELETE /api/players/:id - Delete a player and their scores (admin)
//!
//! Form endpoints used by the players page (admin, redirect back):
//! - POST /players, POST /players/:id, POST /players/:id/delete, DELETE /players/:id

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    Form, Json,
};
use std::sync::Arc;

use crate::api::auth::AdminUser;
use crate::api::dto::{PlayerListParams, PlayerListResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::storage::{NewPlayer, Player};

const PLAYERS_PAGE: &str = "/players";

/// GET /api/players
pub async fn list_players(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlayerListParams>,
) -> ApiResult<Json<PlayerListResponse>> {
    let team = params
        .team
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let players = state.store.list_players(team).await?;

    Ok(Json(PlayerListResponse {
        total: players.len(),
        players,
    }))
}

/// GET /api/players/:id
pub async fn get_player(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Player>> {
    state
        .store
        .get_player(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Player {} not found", id)))
}

/// POST /api/players
pub async fn create_player(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(req): Json<NewPlayer>,
) -> ApiResult<(StatusCode, Json<Player>)> {
    let player = state.store.create_player(req).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

/// PUT /api/players/:id
pub async fn update_player(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Json(req): Json<NewPlayer>,
) -> ApiResult<Json<Player>> {
    let player = state.store.update_player(id, req).await?;
    Ok(Json(player))
}

/// DELETE /api/players/:id
pub async fn delete_player(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.store.delete_player(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /players
pub async fn create_player_form(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Form(req): Form<NewPlayer>,
) -> ApiResult<Redirect> {
    state.store.create_player(req).await?;
    Ok(Redirect::to(PLAYERS_PAGE))
}

/// POST /players/:id
pub async fn update_player_form(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
    Form(req): Form<NewPlayer>,
) -> ApiResult<Redirect> {
    state.store.update_player(id, req).await?;
    Ok(Redirect::to(PLAYERS_PAGE))
}

/// POST /players/:id/delete and DELETE /players/:id
pub async fn delete_player_form(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<Redirect> {
    state.store.delete_player(id).await?;
    Ok(Redirect::to(PLAYERS_PAGE))
}
