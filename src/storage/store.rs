//! Score Store
//!
//! Owns the SQLite connection and exposes every read and write the
//! dashboard needs:
//! - Players: create, list (optionally by team), get, update, delete
//! - Scores: bulk upsert per gameweek, list with filters, get, update, delete
//!
//! The connection sits behind Tokio's async Mutex; each operation holds it
//! for its statements, and multi-row writes run inside one transaction.

use crate::config::DatabaseConfig;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::schema;
use crate::storage::types::{
    validate_gameweek, BulkOutcome, NewPlayer, Player, Score, ScoreEntry, ScoreFilter,
    ScoreUpdate, StoreStats,
};
use chrono::{SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::Mutex;

const PLAYER_COLUMNS: &str = "id, name, team, created_at";

/// Scores joined with players, with net and running totals per player.
/// Filters are applied outside this view so the running total always
/// covers the player's whole history.
const SCORE_VIEW: &str = "
    SELECT s.id AS id,
           s.player_id AS player_id,
           p.name AS player_name,
           p.team AS team,
           s.gameweek AS gameweek,
           s.week_points AS week_points,
           s.week_cost AS week_cost,
           s.week_points - s.week_cost AS net_points,
           SUM(s.week_points - s.week_cost) OVER (
               PARTITION BY s.player_id
               ORDER BY s.gameweek
               ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW
           ) AS overall_points
    FROM scores s
    JOIN players p ON p.id = s.player_id
";

const SCORE_COLUMNS: &str =
    "id, player_id, player_name, team, gameweek, week_points, week_cost, net_points, overall_points";

/// SQLite-backed store for players and scores
pub struct Store {
    conn: Mutex<Connection>,
    /// None for in-memory databases
    path: Option<PathBuf>,
}

impl Store {
    /// Open (or create) the database file described by `config`
    pub fn open(config: &DatabaseConfig) -> StorageResult<Self> {
        let path = PathBuf::from(&config.path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        schema::apply(&conn)?;

        tracing::debug!(path = ?path, "Opened score database");

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        schema::apply(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// Database file path, if file-backed
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    // ============================================
    // PLAYERS
    // ============================================

    pub async fn create_player(&self, player: NewPlayer) -> StorageResult<Player> {
        let player = player.normalized()?;
        let created_at = Utc::now().trunc_subsecs(0);

        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO players (name, team, created_at) VALUES (?1, ?2, ?3)",
            params![player.name, player.team, created_at],
        )?;
        let id = conn.last_insert_rowid();

        tracing::info!(player_id = id, name = %player.name, team = %player.team, "Created player");

        Ok(Player {
            id,
            name: player.name,
            team: player.team,
            created_at,
        })
    }

    /// List players ordered by team then name, optionally for one team only
    pub async fn list_players(&self, team: Option<&str>) -> StorageResult<Vec<Player>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM players WHERE (?1 IS NULL OR team = ?1) ORDER BY team, name, id",
            PLAYER_COLUMNS
        ))?;

        let players = stmt
            .query_map(params![team], player_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(players)
    }

    pub async fn get_player(&self, id: i64) -> StorageResult<Option<Player>> {
        let conn = self.conn.lock().await;
        fetch_player(&conn, id)
    }

    pub async fn update_player(&self, id: i64, player: NewPlayer) -> StorageResult<Player> {
        let player = player.normalized()?;

        let conn = self.conn.lock().await;
        let changed = conn.execute(
            "UPDATE players SET name = ?1, team = ?2 WHERE id = ?3",
            params![player.name, player.team, id],
        )?;

        if changed == 0 {
            return Err(StorageError::player_not_found(id));
        }

        tracing::info!(player_id = id, name = %player.name, team = %player.team, "Updated player");

        fetch_player(&conn, id)?.ok_or_else(|| StorageError::player_not_found(id))
    }

    /// Delete a player and, through the foreign key cascade, all their scores
    pub async fn delete_player(&self, id: i64) -> StorageResult<()> {
        let conn = self.conn.lock().await;
        let removed = conn.execute("DELETE FROM players WHERE id = ?1", params![id])?;

        if removed == 0 {
            return Err(StorageError::player_not_found(id));
        }

        tracing::info!(player_id = id, "Deleted player");
        Ok(())
    }

    // ============================================
    // SCORES
    // ============================================

    /// Insert or update one score per entry for `gameweek`.
    ///
    /// All entries are written in one transaction; an unknown player id
    /// rolls back the whole batch.
    pub async fn upsert_scores(
        &self,
        gameweek: i64,
        entries: &[ScoreEntry],
    ) -> StorageResult<BulkOutcome> {
        validate_gameweek(gameweek)?;
        for entry in entries {
            entry.validate()?;
        }

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let mut outcome = BulkOutcome::default();

        {
            let mut player_exists = tx.prepare("SELECT 1 FROM players WHERE id = ?1")?;
            let mut find_existing =
                tx.prepare("SELECT id FROM scores WHERE player_id = ?1 AND gameweek = ?2")?;
            let mut update =
                tx.prepare("UPDATE scores SET week_points = ?1, week_cost = ?2 WHERE id = ?3")?;
            let mut insert = tx.prepare(
                "INSERT INTO scores (player_id, gameweek, week_points, week_cost)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            for entry in entries {
                if !player_exists.exists(params![entry.player_id])? {
                    return Err(StorageError::player_not_found(entry.player_id));
                }

                let existing: Option<i64> = find_existing
                    .query_row(params![entry.player_id, gameweek], |row| row.get(0))
                    .optional()?;

                match existing {
                    Some(score_id) => {
                        update.execute(params![entry.week_points, entry.week_cost, score_id])?;
                        outcome.updated += 1;
                    }
                    None => {
                        insert.execute(params![
                            entry.player_id,
                            gameweek,
                            entry.week_points,
                            entry.week_cost
                        ])?;
                        outcome.created += 1;
                    }
                }
            }
        }

        tx.commit()?;

        tracing::info!(
            gameweek,
            created = outcome.created,
            updated = outcome.updated,
            "Saved gameweek scores"
        );

        Ok(outcome)
    }

    /// List scores ordered by gameweek, team, player name
    pub async fn list_scores(&self, filter: &ScoreFilter) -> StorageResult<Vec<Score>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM ({})
             WHERE (?1 IS NULL OR player_id = ?1) AND (?2 IS NULL OR gameweek = ?2)
             ORDER BY gameweek, team, player_name, id",
            SCORE_COLUMNS, SCORE_VIEW
        ))?;

        let scores = stmt
            .query_map(params![filter.player_id, filter.gameweek], score_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(scores)
    }

    pub async fn get_score(&self, id: i64) -> StorageResult<Option<Score>> {
        let conn = self.conn.lock().await;
        fetch_score(&conn, id)
    }

    /// Replace a score's fields.
    ///
    /// Moving a score onto a (player, gameweek) slot that already holds a
    /// different score is a conflict.
    pub async fn update_score(&self, id: i64, update: ScoreUpdate) -> StorageResult<Score> {
        update.validate()?;

        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let score_exists = tx
            .prepare("SELECT 1 FROM scores WHERE id = ?1")?
            .exists(params![id])?;
        if !score_exists {
            return Err(StorageError::score_not_found(id));
        }

        let player_exists = tx
            .prepare("SELECT 1 FROM players WHERE id = ?1")?
            .exists(params![update.player_id])?;
        if !player_exists {
            return Err(StorageError::player_not_found(update.player_id));
        }

        let clash: Option<i64> = tx
            .query_row(
                "SELECT id FROM scores WHERE player_id = ?1 AND gameweek = ?2 AND id != ?3",
                params![update.player_id, update.gameweek, id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(other) = clash {
            return Err(StorageError::Conflict(format!(
                "Player {} already has score {} for gameweek {}",
                update.player_id, other, update.gameweek
            )));
        }

        tx.execute(
            "UPDATE scores
             SET player_id = ?1, gameweek = ?2, week_points = ?3, week_cost = ?4
             WHERE id = ?5",
            params![
                update.player_id,
                update.gameweek,
                update.week_points,
                update.week_cost,
                id
            ],
        )?;
        tx.commit()?;

        tracing::info!(
            score_id = id,
            player_id = update.player_id,
            gameweek = update.gameweek,
            "Updated score"
        );

        fetch_score(&conn, id)?.ok_or_else(|| StorageError::score_not_found(id))
    }

    pub async fn delete_score(&self, id: i64) -> StorageResult<()> {
        let conn = self.conn.lock().await;
        let removed = conn.execute("DELETE FROM scores WHERE id = ?1", params![id])?;

        if removed == 0 {
            return Err(StorageError::score_not_found(id));
        }

        tracing::info!(score_id = id, "Deleted score");
        Ok(())
    }

    /// Highest gameweek with any score, ignoring filters
    pub async fn max_gameweek(&self) -> StorageResult<Option<i64>> {
        let conn = self.conn.lock().await;
        let max = conn.query_row("SELECT MAX(gameweek) FROM scores", [], |row| row.get(0))?;
        Ok(max)
    }

    pub async fn stats(&self) -> StorageResult<StoreStats> {
        let conn = self.conn.lock().await;

        let players: i64 = conn.query_row("SELECT COUNT(*) FROM players", [], |row| row.get(0))?;
        let scores: i64 = conn.query_row("SELECT COUNT(*) FROM scores", [], |row| row.get(0))?;
        let max_gameweek: Option<i64> =
            conn.query_row("SELECT MAX(gameweek) FROM scores", [], |row| row.get(0))?;

        Ok(StoreStats {
            players: players as usize,
            scores: scores as usize,
            max_gameweek,
        })
    }

    /// Cheap round trip used by the readiness probe
    pub async fn ping(&self) -> StorageResult<()> {
        let conn = self.conn.lock().await;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

fn fetch_player(conn: &Connection, id: i64) -> StorageResult<Option<Player>> {
    let player = conn
        .query_row(
            &format!("SELECT {} FROM players WHERE id = ?1", PLAYER_COLUMNS),
            params![id],
            player_from_row,
        )
        .optional()?;
    Ok(player)
}

fn fetch_score(conn: &Connection, id: i64) -> StorageResult<Option<Score>> {
    let score = conn
        .query_row(
            &format!("SELECT {} FROM ({}) WHERE id = ?1", SCORE_COLUMNS, SCORE_VIEW),
            params![id],
            score_from_row,
        )
        .optional()?;
    Ok(score)
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        team: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn score_from_row(row: &Row<'_>) -> rusqlite::Result<Score> {
    Ok(Score {
        id: row.get(0)?,
        player_id: row.get(1)?,
        player_name: row.get(2)?,
        team: row.get(3)?,
        gameweek: row.get(4)?,
        week_points: row.get(5)?,
        week_cost: row.get(6)?,
        net_points: row.get(7)?,
        overall_points: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn store_with_players() -> (Store, Player, Player) {
        let store = Store::open_in_memory().unwrap();
        let sam = store
            .create_player(NewPlayer::new("Sam", "Pharaohs"))
            .await
            .unwrap();
        let alex = store
            .create_player(NewPlayer::new("Alex", "Hurricanes"))
            .await
            .unwrap();
        (store, sam, alex)
    }

    #[tokio::test]
    async fn test_created_player_is_listed() {
        let (store, sam, alex) = store_with_players().await;

        let players = store.list_players(None).await.unwrap();
        assert_eq!(players.len(), 2);
        // Ordered by team: Hurricanes before Pharaohs
        assert_eq!(players[0].id, alex.id);
        assert_eq!(players[1].id, sam.id);

        let pharaohs = store.list_players(Some("Pharaohs")).await.unwrap();
        assert_eq!(pharaohs.len(), 1);
        assert_eq!(pharaohs[0].name, "Sam");
    }

    #[tokio::test]
    async fn test_update_player() {
        let (store, sam, _) = store_with_players().await;

        let updated = store
            .update_player(sam.id, NewPlayer::new("Samuel", "Kings"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Samuel");
        assert_eq!(updated.team, "Kings");

        let fetched = store.get_player(sam.id).await.unwrap().unwrap();
        assert_eq!(fetched.team, "Kings");
    }

    #[tokio::test]
    async fn test_update_missing_player() {
        let store = Store::open_in_memory().unwrap();
        let err = store
            .update_player(99, NewPlayer::new("Nobody", "None"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { id: 99, .. }));
    }

    #[tokio::test]
    async fn test_bulk_upsert_creates_then_updates() {
        let (store, sam, alex) = store_with_players().await;

        let outcome = store
            .upsert_scores(
                1,
                &[ScoreEntry::new(sam.id, 60, 0), ScoreEntry::new(alex.id, 45, 4)],
            )
            .await
            .unwrap();
        assert_eq!(outcome, BulkOutcome { created: 2, updated: 0 });

        let outcome = store
            .upsert_scores(1, &[ScoreEntry::new(sam.id, 72, 0)])
            .await
            .unwrap();
        assert_eq!(outcome, BulkOutcome { created: 0, updated: 1 });

        let gw1 = store
            .list_scores(&ScoreFilter::all().gameweek(1))
            .await
            .unwrap();
        assert_eq!(gw1.len(), 2);
        let sam_gw1 = gw1.iter().find(|s| s.player_id == sam.id).unwrap();
        assert_eq!(sam_gw1.week_points, 72);
    }

    #[tokio::test]
    async fn test_bulk_upsert_unknown_player_rolls_back() {
        let (store, sam, _) = store_with_players().await;

        let err = store
            .upsert_scores(
                2,
                &[ScoreEntry::new(sam.id, 50, 0), ScoreEntry::new(404, 10, 0)],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { id: 404, .. }));

        let scores = store.list_scores(&ScoreFilter::all()).await.unwrap();
        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn test_bulk_upsert_rejects_bad_gameweek() {
        let (store, sam, _) = store_with_players().await;

        let err = store
            .upsert_scores(39, &[ScoreEntry::new(sam.id, 50, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
    }

    #[tokio::test]
    async fn test_overall_points_are_running_net_totals() {
        let (store, sam, _) = store_with_players().await;

        store
            .upsert_scores(1, &[ScoreEntry::new(sam.id, 60, 0)])
            .await
            .unwrap();
        store
            .upsert_scores(2, &[ScoreEntry::new(sam.id, 40, 4)])
            .await
            .unwrap();
        store
            .upsert_scores(3, &[ScoreEntry::new(sam.id, 55, 0)])
            .await
            .unwrap();

        let scores = store
            .list_scores(&ScoreFilter::all().player(sam.id))
            .await
            .unwrap();
        let overall: Vec<i64> = scores.iter().map(|s| s.overall_points).collect();
        assert_eq!(overall, vec![60, 96, 151]);
        assert_eq!(scores[1].net_points, 36);

        // Filtering by gameweek keeps the full-history running total
        let gw3 = store
            .list_scores(&ScoreFilter::all().gameweek(3))
            .await
            .unwrap();
        assert_eq!(gw3[0].overall_points, 151);
    }

    #[tokio::test]
    async fn test_update_score_recomputes_later_totals() {
        let (store, sam, _) = store_with_players().await;

        store
            .upsert_scores(1, &[ScoreEntry::new(sam.id, 60, 0)])
            .await
            .unwrap();
        store
            .upsert_scores(2, &[ScoreEntry::new(sam.id, 40, 0)])
            .await
            .unwrap();

        let gw1 = store
            .list_scores(&ScoreFilter::all().gameweek(1))
            .await
            .unwrap()
            .remove(0);

        let updated = store
            .update_score(
                gw1.id,
                ScoreUpdate {
                    player_id: sam.id,
                    gameweek: 1,
                    week_points: 80,
                    week_cost: 8,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.overall_points, 72);

        let gw2 = store
            .list_scores(&ScoreFilter::all().gameweek(2))
            .await
            .unwrap()
            .remove(0);
        assert_eq!(gw2.overall_points, 112);
    }

    #[tokio::test]
    async fn test_update_score_conflict() {
        let (store, sam, _) = store_with_players().await;

        store
            .upsert_scores(1, &[ScoreEntry::new(sam.id, 60, 0)])
            .await
            .unwrap();
        store
            .upsert_scores(2, &[ScoreEntry::new(sam.id, 40, 0)])
            .await
            .unwrap();

        let gw2 = store
            .list_scores(&ScoreFilter::all().gameweek(2))
            .await
            .unwrap()
            .remove(0);

        let err = store
            .update_score(
                gw2.id,
                ScoreUpdate {
                    player_id: sam.id,
                    gameweek: 1,
                    week_points: 10,
                    week_cost: 0,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_score_and_missing_score() {
        let (store, sam, _) = store_with_players().await;

        store
            .upsert_scores(1, &[ScoreEntry::new(sam.id, 60, 0)])
            .await
            .unwrap();
        let score = store
            .list_scores(&ScoreFilter::all())
            .await
            .unwrap()
            .remove(0);

        store.delete_score(score.id).await.unwrap();
        assert!(store.get_score(score.id).await.unwrap().is_none());

        let err = store.delete_score(score.id).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_player_cascades_scores() {
        let (store, sam, alex) = store_with_players().await;

        store
            .upsert_scores(
                1,
                &[ScoreEntry::new(sam.id, 60, 0), ScoreEntry::new(alex.id, 50, 0)],
            )
            .await
            .unwrap();

        store.delete_player(sam.id).await.unwrap();

        let scores = store.list_scores(&ScoreFilter::all()).await.unwrap();
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].player_id, alex.id);
    }

    #[tokio::test]
    async fn test_max_gameweek_and_stats() {
        let (store, sam, alex) = store_with_players().await;
        assert_eq!(store.max_gameweek().await.unwrap(), None);

        store
            .upsert_scores(4, &[ScoreEntry::new(sam.id, 60, 0)])
            .await
            .unwrap();
        store
            .upsert_scores(2, &[ScoreEntry::new(alex.id, 30, 0)])
            .await
            .unwrap();

        assert_eq!(store.max_gameweek().await.unwrap(), Some(4));

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.players, 2);
        assert_eq!(stats.scores, 2);
        assert_eq!(stats.max_gameweek, Some(4));
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() {
        let dir = tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("data").join("fpl.db").to_string_lossy().to_string(),
            ..Default::default()
        };

        {
            let store = Store::open(&config).unwrap();
            store
                .create_player(NewPlayer::new("Jo", "Wanderers"))
                .await
                .unwrap();
        }

        let store = Store::open(&config).unwrap();
        assert!(store.path().is_some());
        let players = store.list_players(None).await.unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].name, "Jo");
    }
}
