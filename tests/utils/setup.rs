use std::sync::Arc;

use podium::{
    broadcast::{Broadcaster, InMemoryBroadcaster},
    leaderboard::{InMemoryScoreStore, LeaderboardEntry, LeaderboardService, RankEngine},
};

use super::viewers::TestViewer;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub store: Arc<InMemoryScoreStore>,
    pub service: Arc<LeaderboardService>,
    pub broadcaster: Arc<InMemoryBroadcaster>,
}

impl TestSetup {
    /// Register a viewer the way the WebSocket handler does: snapshot first,
    /// then a live outbound channel.
    pub async fn connect_viewer(&self) -> TestViewer {
        let snapshot = self.service.ranked_snapshot().await.unwrap();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let viewer_id = self.broadcaster.on_connect(tx, &snapshot).await;
        TestViewer::new(viewer_id, rx)
    }
}

pub struct TestSetupBuilder {
    scores: Vec<(String, i64)>,
    ranked: bool,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            scores: vec![],
            ranked: false,
        }
    }

    pub fn with_scores(mut self, scores: &[(&str, i64)]) -> Self {
        self.scores = scores
            .iter()
            .map(|(user_id, points)| (user_id.to_string(), *points))
            .collect();
        self
    }

    /// Run one recompute during setup so tests start from a ranked board.
    pub fn ranked(mut self) -> Self {
        self.ranked = true;
        self
    }

    pub async fn build(self) -> TestSetup {
        let store = Arc::new(InMemoryScoreStore::with_entries(
            self.scores
                .iter()
                .map(|(user_id, points)| LeaderboardEntry::new(user_id.clone(), *points))
                .collect(),
        ));
        let engine = Arc::new(RankEngine::new(store.clone()));
        let broadcaster = Arc::new(InMemoryBroadcaster::new());
        let service = Arc::new(LeaderboardService::new(engine, broadcaster.clone()));

        if self.ranked {
            service.refresh().await.unwrap();
        }

        TestSetup {
            store,
            service,
            broadcaster,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}
