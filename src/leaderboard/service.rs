use std::sync::Arc;
use tracing::{error, info, instrument};

use super::engine::{RankEngine, RecomputeOutcome};
use super::models::{LeaderboardEntry, RankedEntry};
use crate::broadcast::Broadcaster;
use crate::shared::AppError;

/// Ties the rank engine to the viewer fan-out.
///
/// Both trigger paths end up here: direct score writes request a detached
/// refresh, the scheduler awaits one per tick. A refresh that changes at
/// least one rank is pushed to every connected viewer as the full list.
pub struct LeaderboardService {
    engine: Arc<RankEngine>,
    broadcaster: Arc<dyn Broadcaster>,
}

impl LeaderboardService {
    pub fn new(
        engine: Arc<RankEngine>,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            engine,
            broadcaster,
        }
    }

    /// Persist a player's new total and request a rank refresh.
    ///
    /// Returns once the write is durable. The refresh runs detached so score
    /// writers never wait on a full-board sort; its failures are logged and
    /// healed by the next scheduler tick.
    #[instrument(skip(self))]
    pub async fn update_score(&self, user_id: &str, total_points: i64) -> Result<(), AppError> {
        self.engine.update_score(user_id, total_points).await?;

        let engine = Arc::clone(&self.engine);
        let broadcaster = Arc::clone(&self.broadcaster);
        let user_id = user_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = refresh_and_publish(&engine, broadcaster.as_ref()).await {
                error!(error = %e, user_id = %user_id, "Deferred rank refresh failed");
            }
        });

        Ok(())
    }

    /// Run a coalesced recompute and publish the result when ranks moved.
    ///
    /// Returns the number of entries whose rank changed; 0 when nothing
    /// moved or when the request was absorbed by a pass already in flight.
    pub async fn refresh(&self) -> Result<usize, AppError> {
        refresh_and_publish(&self.engine, self.broadcaster.as_ref()).await
    }

    /// Current stale-but-consistent ranked list, for reads and for the
    /// snapshot sent to a viewer on connect.
    pub async fn snapshot(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        self.engine.snapshot().await
    }

    /// Snapshot in wire form.
    pub async fn ranked_snapshot(&self) -> Result<Vec<RankedEntry>, AppError> {
        let entries = self.snapshot().await?;
        Ok(entries.iter().map(RankedEntry::from).collect())
    }
}

async fn refresh_and_publish(
    engine: &RankEngine,
    broadcaster: &dyn Broadcaster,
) -> Result<usize, AppError> {
    match engine.recompute().await? {
        RecomputeOutcome::Completed { changes, snapshot } if !changes.is_empty() => {
            let ranked: Vec<RankedEntry> = snapshot.iter().map(RankedEntry::from).collect();
            broadcaster.publish_update(&ranked).await;
            info!(changed = changes.len(), "Published leaderboard update");
            Ok(changes.len())
        }
        RecomputeOutcome::Completed { .. } | RecomputeOutcome::Coalesced => Ok(0),
    }
}
