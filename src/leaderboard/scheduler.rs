use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{error, info};

use super::service::LeaderboardService;

/// Fixed-interval recompute backstop.
///
/// Ticks independently of score writes, bounding leaderboard staleness to
/// one interval even when every direct trigger was absorbed or failed. The
/// first tick fires immediately, so ranks heal right after startup.
pub struct Scheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    /// Spawns the scheduler task. `tick_interval` must already be validated
    /// as positive by the configuration layer.
    pub fn start(service: Arc<LeaderboardService>, tick_interval: Duration) -> Self {
        info!(
            interval_secs = tick_interval.as_secs(),
            "Starting leaderboard recompute scheduler"
        );

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut tick = interval(tick_interval);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        // A failed attempt never halts future ticks; prior
                        // ranks stay valid until the next one succeeds.
                        match service.refresh().await {
                            Ok(changed) => {
                                info!(changed, "Scheduled recompute completed");
                            }
                            Err(e) => {
                                error!(error = %e, "Scheduled recompute failed");
                            }
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            info!("Leaderboard scheduler stopped");
        });

        Self { shutdown, handle }
    }

    /// Stop issuing ticks and wait for any in-flight recompute to finish.
    ///
    /// The refresh is awaited inside the tick arm, so the task only observes
    /// the shutdown signal between passes. Drain, not abort.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::{Broadcaster, InMemoryBroadcaster};
    use crate::leaderboard::engine::RankEngine;
    use crate::leaderboard::models::LeaderboardEntry;
    use crate::leaderboard::store::{InMemoryScoreStore, ScoreStore};
    use crate::shared::AppError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tokio::time::sleep;

    /// Test helper functions for wiring a scheduler over in-memory parts
    mod helpers {
        use super::*;

        pub fn service_over(store: Arc<dyn ScoreStore>) -> Arc<LeaderboardService> {
            let engine = Arc::new(RankEngine::new(store));
            let broadcaster: Arc<dyn Broadcaster> =
                Arc::new(InMemoryBroadcaster::new());
            Arc::new(LeaderboardService::new(engine, broadcaster))
        }
    }

    use helpers::*;

    #[tokio::test]
    async fn test_tick_recomputes_without_direct_trigger() {
        let store = Arc::new(InMemoryScoreStore::with_entries(vec![
            LeaderboardEntry::new("a".to_string(), 10),
            LeaderboardEntry::new("b".to_string(), 20),
        ]));
        let service = service_over(store.clone());

        let scheduler = Scheduler::start(service, Duration::from_millis(10));
        sleep(Duration::from_millis(50)).await;
        scheduler.stop().await;

        let entries = store.read_all().await.unwrap();
        let mut ranks: Vec<u32> = entries.iter().map(|e| e.rank).collect();
        ranks.sort();
        assert_eq!(ranks, vec![1, 2]);
    }

    /// Store whose reads always fail, counting the attempts.
    struct AlwaysFailingStore {
        reads: AtomicU32,
    }

    #[async_trait]
    impl ScoreStore for AlwaysFailingStore {
        async fn read_all(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Err(AppError::StoreError("down".to_string()))
        }

        async fn write_ranks(&self, _changed: &[LeaderboardEntry]) -> Result<(), AppError> {
            Ok(())
        }

        async fn update_total(&self, _user_id: &str, _total: i64) -> Result<(), AppError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failed_tick_does_not_halt_scheduler() {
        let store = Arc::new(AlwaysFailingStore {
            reads: AtomicU32::new(0),
        });
        let service = service_over(store.clone());

        let scheduler = Scheduler::start(service, Duration::from_millis(10));
        sleep(Duration::from_millis(60)).await;
        scheduler.stop().await;

        // Several ticks despite every one failing.
        assert!(store.reads.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_stop_ends_ticking() {
        let store = Arc::new(AlwaysFailingStore {
            reads: AtomicU32::new(0),
        });
        let service = service_over(store.clone());

        let scheduler = Scheduler::start(service, Duration::from_millis(10));
        sleep(Duration::from_millis(30)).await;
        scheduler.stop().await;

        let after_stop = store.reads.load(Ordering::SeqCst);
        sleep(Duration::from_millis(40)).await;
        assert_eq!(store.reads.load(Ordering::SeqCst), after_stop);
    }

    /// Store that records whether a read was in flight when shutdown began.
    struct SlowStore {
        inner: InMemoryScoreStore,
        in_pass: AtomicBool,
        completed_passes: AtomicU32,
    }

    #[async_trait]
    impl ScoreStore for SlowStore {
        async fn read_all(&self) -> Result<Vec<LeaderboardEntry>, AppError> {
            self.in_pass.store(true, Ordering::SeqCst);
            sleep(Duration::from_millis(30)).await;
            self.inner.read_all().await
        }

        async fn write_ranks(&self, changed: &[LeaderboardEntry]) -> Result<(), AppError> {
            let result = self.inner.write_ranks(changed).await;
            self.in_pass.store(false, Ordering::SeqCst);
            self.completed_passes.fetch_add(1, Ordering::SeqCst);
            result
        }

        async fn update_total(&self, user_id: &str, total: i64) -> Result<(), AppError> {
            self.inner.update_total(user_id, total).await
        }
    }

    #[tokio::test]
    async fn test_stop_drains_in_flight_recompute() {
        let store = Arc::new(SlowStore {
            inner: InMemoryScoreStore::with_entries(vec![LeaderboardEntry::new(
                "a".to_string(),
                10,
            )]),
            in_pass: AtomicBool::new(false),
            completed_passes: AtomicU32::new(0),
        });
        let service = service_over(store.clone());

        let scheduler = Scheduler::start(service, Duration::from_millis(500));
        // Wait until the immediate first tick is mid-pass, then stop.
        while !store.in_pass.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        scheduler.stop().await;

        // stop() returned only after the pass ran to completion.
        assert_eq!(store.completed_passes.load(Ordering::SeqCst), 1);
        assert!(!store.in_pass.load(Ordering::SeqCst));
    }
}
