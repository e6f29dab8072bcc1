use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rank value carried by entries that have never been through a recompute.
///
/// Entries are created when a player first scores; they stay at
/// `UNRANKED` until the next pass assigns them a real 1-based position.
pub const UNRANKED: u32 = 0;

/// A player's row on the leaderboard.
///
/// `total_points` is the authoritative quantity owned by the score store;
/// `rank` is derived from it on every recompute and is stale between passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub total_points: i64,
    pub rank: u32,
    pub updated_at: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn new(user_id: String, total_points: i64) -> Self {
        Self {
            user_id,
            total_points,
            rank: UNRANKED,
            updated_at: Utc::now(),
        }
    }
}

/// Wire-facing projection of an entry, carried by leaderboard update events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub user_id: String,
    pub rank: u32,
    pub total_points: i64,
}

impl From<&LeaderboardEntry> for RankedEntry {
    fn from(entry: &LeaderboardEntry) -> Self {
        Self {
            user_id: entry.user_id.clone(),
            rank: entry.rank,
            total_points: entry.total_points,
        }
    }
}
