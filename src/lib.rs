//! # FPL Tracker
//!
//! A small league dashboard for a Fantasy Premier League mini-league: players
//! belong to teams, an admin enters each player's weekly points and transfer
//! costs, and the dashboard charts every team's weekly and cumulative score.
//!
//! ## Modules
//!
//! - [`storage`]: SQLite store for players and scores
//! - [`standings`]: Chart series and league table built from score rows
//! - [`api`]: HTTP server with Axum (pages, forms, JSON, Basic auth)
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fpl_tracker::standings::team_standings;
//! use fpl_tracker::storage::{NewPlayer, ScoreEntry, ScoreFilter, Store};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::open_in_memory()?;
//!
//!     let sam = store.create_player(NewPlayer::new("Sam", "Red Devils")).await?;
//!     store.upsert_scores(1, &[ScoreEntry::new(sam.id, 64, 4)]).await?;
//!
//!     let scores = store.list_scores(&ScoreFilter::all()).await?;
//!     for row in team_standings(&scores) {
//!         println!("{}. {} {}", row.rank, row.team, row.net_points);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod standings;
pub mod storage;

// Re-export top-level types for convenience
pub use storage::{
    NewPlayer, Player, Score, ScoreEntry, ScoreFilter, ScoreUpdate, StorageError, StorageResult,
    Store,
};

pub use standings::{build_charts, team_standings, ChartData, TeamStanding};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, LoggingConfig};
