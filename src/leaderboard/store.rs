use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument, warn};

use super::models::LeaderboardEntry;
use crate::shared::AppError;

/// Trait for the durable player -> accumulated points mapping.
///
/// Rank persistence is split from total persistence on purpose: a rank
/// write must never clobber a total that changed while a recompute pass
/// was reading its snapshot.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    /// Read every entry currently on the leaderboard.
    async fn read_all(&self) -> Result<Vec<LeaderboardEntry>, AppError>;

    /// Idempotent partial upsert: persist the new rank of each changed entry.
    async fn write_ranks(&self, changed: &[LeaderboardEntry]) -> Result<(), AppError>;

    /// Single-record upsert of a player's accumulated total. Creates the
    /// entry (unranked) on a player's first score.
    async fn update_total(&self, user_id: &str, total_points: i64) -> Result<(), AppError>;
}

/// In-memory implementation of ScoreStore for development and testing
///
/// Data is stored in memory and lost when the application restarts.
pub struct InMemoryScoreStore {
    entries: Mutex<HashMap<String, LeaderboardEntry>>,
}

impl Default for InMemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryScoreStore {
    /// Creates a new empty in-memory store
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an in-memory store with pre-populated entries
    pub fn with_entries(entries: Vec<LeaderboardEntry>) -> Self {
        let mut map = HashMap::new();
        for entry in entries {
            map.insert(entry.user_id.clone(), entry);
        }

        Self {
            entries: Mutex::new(map),
        }
    }

    /// Returns the current number of entries in the store
    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl ScoreStore for InMemoryScoreStore {
    #[instrument(skip(self))]
    async fn read_all(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        let entries = self.entries.lock().unwrap();
        debug!(count = entries.len(), "Read all entries from memory");
        Ok(entries.values().cloned().collect())
    }

    #[instrument(skip(self, changed))]
    async fn write_ranks(&self, changed: &[LeaderboardEntry]) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap();
        for change in changed {
            match entries.get_mut(&change.user_id) {
                Some(entry) => {
                    entry.rank = change.rank;
                    entry.updated_at = change.updated_at;
                }
                None => {
                    // Entry vanished between snapshot and write; upsert keeps
                    // the operation idempotent either way.
                    entries.insert(change.user_id.clone(), change.clone());
                }
            }
        }

        debug!(count = changed.len(), "Persisted rank changes in memory");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_total(&self, user_id: &str, total_points: i64) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(user_id) {
            Some(entry) => {
                entry.total_points = total_points;
                entry.updated_at = Utc::now();
                debug!(user_id = %user_id, total_points, "Updated total in memory");
            }
            None => {
                entries.insert(
                    user_id.to_string(),
                    LeaderboardEntry::new(user_id.to_string(), total_points),
                );
                debug!(user_id = %user_id, total_points, "Created entry in memory");
            }
        }

        Ok(())
    }
}

/// PostgreSQL implementation of the score store
pub struct PostgresScoreStore {
    pool: PgPool,
}

impl PostgresScoreStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreStore for PostgresScoreStore {
    #[instrument(skip(self))]
    async fn read_all(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        let rows = sqlx::query(
            "SELECT user_id, total_points, rank, updated_at FROM leaderboard_entries",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to read leaderboard entries from database");
            AppError::StoreError(e.to_string())
        })?;

        let entries = rows
            .iter()
            .map(|row| LeaderboardEntry {
                user_id: row.get("user_id"),
                total_points: row.get("total_points"),
                rank: row.get::<i32, _>("rank") as u32,
                updated_at: row.get("updated_at"),
            })
            .collect();

        Ok(entries)
    }

    #[instrument(skip(self, changed))]
    async fn write_ranks(&self, changed: &[LeaderboardEntry]) -> Result<(), AppError> {
        for change in changed {
            sqlx::query(
                "INSERT INTO leaderboard_entries (user_id, total_points, rank, updated_at) \
                 VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (user_id) DO UPDATE SET rank = $3, updated_at = $4",
            )
            .bind(&change.user_id)
            .bind(change.total_points)
            .bind(change.rank as i32)
            .bind(change.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, user_id = %change.user_id, "Failed to persist rank change");
                AppError::StoreError(e.to_string())
            })?;
        }

        debug!(count = changed.len(), "Persisted rank changes in database");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_total(&self, user_id: &str, total_points: i64) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO leaderboard_entries (user_id, total_points, rank, updated_at) \
             VALUES ($1, $2, 0, $3) \
             ON CONFLICT (user_id) DO UPDATE SET total_points = $2, updated_at = $3",
        )
        .bind(user_id)
        .bind(total_points)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, user_id = %user_id, "Failed to update total in database");
            AppError::StoreError(e.to_string())
        })?;

        debug!(user_id = %user_id, total_points, "Updated total in database");
        Ok(())
    }
}
