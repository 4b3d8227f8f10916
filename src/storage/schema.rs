//! SQLite schema
//!
//! Created idempotently on every open. Overall points are not a column:
//! they are derived per query with a window function.

use rusqlite::Connection;

/// Bumped whenever the table layout changes
pub const SCHEMA_VERSION: i64 = 1;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS players (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT    NOT NULL,
    team        TEXT    NOT NULL,
    created_at  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS scores (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    player_id    INTEGER NOT NULL REFERENCES players (id) ON DELETE CASCADE,
    gameweek     INTEGER NOT NULL CHECK (gameweek >= 1 AND gameweek <= 38),
    week_points  INTEGER NOT NULL CHECK (week_points >= 0 AND week_points <= 1000),
    week_cost    INTEGER NOT NULL DEFAULT 0 CHECK (week_cost >= 0 AND week_cost <= 1000),
    UNIQUE (player_id, gameweek)
);

CREATE INDEX IF NOT EXISTS idx_players_team ON players (team);
CREATE INDEX IF NOT EXISTS idx_scores_gameweek ON scores (gameweek);
";

/// Enable per-connection pragmas and create tables
pub fn apply(conn: &Connection) -> rusqlite::Result<()> {
    // Foreign keys are off by default in SQLite and must be enabled per connection
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}
