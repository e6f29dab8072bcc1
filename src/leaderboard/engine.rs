use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument};

use super::models::{LeaderboardEntry, UNRANKED};
use super::store::ScoreStore;
use crate::shared::AppError;

/// Result of a recompute request.
#[derive(Debug)]
pub enum RecomputeOutcome {
    /// This caller held the critical section and ran the pass, plus at most
    /// one follow-up per window of absorbed requests. Carries the entries
    /// whose rank changed and the full ranked list after the final pass.
    Completed {
        changes: Vec<LeaderboardEntry>,
        snapshot: Vec<LeaderboardEntry>,
    },
    /// A pass was already in flight; this request was absorbed into its
    /// follow-up run.
    Coalesced,
}

/// Derives ranks from accumulated totals.
///
/// Recomputation is a serialized critical section: concurrent requests never
/// start a second pass, they re-arm the running one instead. Rank state is
/// therefore single-writer even though score writes keep flowing freely.
pub struct RankEngine {
    store: Arc<dyn ScoreStore>,
    pass_gate: AsyncMutex<()>,
    rerun_requested: AtomicBool,
}

impl RankEngine {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self {
            store,
            pass_gate: AsyncMutex::new(()),
            rerun_requested: AtomicBool::new(false),
        }
    }

    /// Persist a player's new accumulated total.
    ///
    /// Returns once the store write is durable. Deriving the new ranks is a
    /// separate step; callers request it through [`RankEngine::recompute`]
    /// so score writers are never blocked on a sort of the whole board.
    #[instrument(skip(self))]
    pub async fn update_score(&self, user_id: &str, total_points: i64) -> Result<(), AppError> {
        self.store.update_total(user_id, total_points).await
    }

    /// Run the sort-and-assign pass, coalescing overlapping requests.
    ///
    /// If no pass is in flight this caller becomes the runner: it loops
    /// while the re-run flag is set, so any request absorbed mid-pass is
    /// covered by exactly one follow-up pass. If a pass is in flight the
    /// request only arms the flag and returns [`RecomputeOutcome::Coalesced`].
    pub async fn recompute(&self) -> Result<RecomputeOutcome, AppError> {
        self.rerun_requested.store(true, Ordering::SeqCst);

        let mut merged: HashMap<String, LeaderboardEntry> = HashMap::new();
        let mut snapshot = Vec::new();
        let mut ran = false;

        loop {
            {
                let Ok(_guard) = self.pass_gate.try_lock() else {
                    if ran {
                        // The new lock holder owns the remaining request.
                        break;
                    }
                    debug!("Recompute already in flight; request absorbed");
                    return Ok(RecomputeOutcome::Coalesced);
                };

                while self.rerun_requested.swap(false, Ordering::SeqCst) {
                    let (changes, ranked) = self.recompute_pass().await?;
                    for change in changes {
                        merged.insert(change.user_id.clone(), change);
                    }
                    snapshot = ranked;
                    ran = true;
                }
            }

            // A request that slipped in as the gate was released would
            // otherwise wait for the next tick; pick it up here instead.
            if !self.rerun_requested.load(Ordering::SeqCst) {
                break;
            }
        }

        if !ran {
            // The flag was consumed by a pass that was already in flight.
            return Ok(RecomputeOutcome::Coalesced);
        }

        let mut changes: Vec<LeaderboardEntry> = merged.into_values().collect();
        changes.sort_by_key(|entry| entry.rank);

        Ok(RecomputeOutcome::Completed { changes, snapshot })
    }

    /// One full read-sort-assign-write pass. Returns the minimal change set
    /// and the complete ranked list.
    async fn recompute_pass(
        &self,
    ) -> Result<(Vec<LeaderboardEntry>, Vec<LeaderboardEntry>), AppError> {
        let mut entries = self.store.read_all().await?;
        entries.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        let now = Utc::now();
        let mut changes = Vec::new();
        for (position, entry) in entries.iter_mut().enumerate() {
            let new_rank = (position + 1) as u32;
            if entry.rank != new_rank {
                entry.rank = new_rank;
                entry.updated_at = now;
                changes.push(entry.clone());
            }
        }

        self.store.write_ranks(&changes).await?;

        info!(
            total = entries.len(),
            changed = changes.len(),
            "Recompute pass completed"
        );
        Ok((changes, entries))
    }

    /// Current stale-but-consistent view: entries ordered by their stored
    /// rank. Entries written after the last pass carry rank 0 and sort last
    /// until the next pass places them.
    pub async fn snapshot(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
        let mut entries = self.store.read_all().await?;
        entries.sort_by(|a, b| match (a.rank, b.rank) {
            (UNRANKED, UNRANKED) => a.user_id.cmp(&b.user_id),
            (UNRANKED, _) => std::cmp::Ordering::Greater,
            (_, UNRANKED) => std::cmp::Ordering::Less,
            (rank_a, rank_b) => rank_a.cmp(&rank_b).then_with(|| a.user_id.cmp(&b.user_id)),
        });
        Ok(entries)
    }
}
