//! FPL Tracker Storage
//!
//! Persistence for players and gameweek scores in a single SQLite file:
//!
//! - **types**: Core data structures (Player, Score, ScoreEntry, ScoreFilter)
//! - **schema**: Table definitions, applied on every open
//! - **store**: The `Store` with all CRUD and aggregate queries
//! - **error**: Error types
//!
//! # Example
//!
//! ```rust,no_run
//! use fpl_tracker::storage::{NewPlayer, ScoreEntry, ScoreFilter, Store};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Store::open_in_memory()?;
//!
//!     let player = store.create_player(NewPlayer::new("Sam", "Pharaohs")).await?;
//!     store.upsert_scores(1, &[ScoreEntry::new(player.id, 64, 4)]).await?;
//!
//!     let scores = store.list_scores(&ScoreFilter::all().player(player.id)).await?;
//!     println!("{} overall", scores[0].overall_points);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod schema;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{StorageError, StorageResult};
pub use store::Store;
pub use types::{
    validate_gameweek, BulkOutcome, NewPlayer, Player, Score, ScoreEntry, ScoreFilter,
    ScoreUpdate, StoreStats, MAX_GAMEWEEK, MAX_WEEK_POINTS,
};
