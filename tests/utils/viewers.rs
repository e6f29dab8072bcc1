use std::time::Duration;

use tokio::sync::mpsc;
use uuid::Uuid;

use podium::{
    broadcast::{LeaderboardUpdatePayload, MessageType, WebSocketMessage},
    leaderboard::RankedEntry,
};

// ============================================================================
// Viewer Double
// ============================================================================

/// A connected viewer as the broadcaster sees one: an outbound channel whose
/// receiving end the test reads (or drops, to simulate a severed connection).
pub struct TestViewer {
    pub viewer_id: Uuid,
    rx: mpsc::UnboundedReceiver<String>,
}

impl TestViewer {
    pub fn new(viewer_id: Uuid, rx: mpsc::UnboundedReceiver<String>) -> Self {
        Self { viewer_id, rx }
    }

    /// Await the next LEADERBOARD_UPDATE and return its entries.
    pub async fn next_update(&mut self) -> Vec<RankedEntry> {
        let raw = tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .expect("timed out waiting for a leaderboard update")
            .expect("viewer channel closed");
        parse_update(&raw)
    }

    /// Non-blocking poll for an already-delivered update.
    pub fn try_next_update(&mut self) -> Option<Vec<RankedEntry>> {
        self.rx.try_recv().ok().map(|raw| parse_update(&raw))
    }

    /// Drop the receiving end so the next send to this viewer fails.
    pub fn sever(self) {}
}

fn parse_update(raw: &str) -> Vec<RankedEntry> {
    let message: WebSocketMessage =
        serde_json::from_str(raw).expect("viewer received malformed message");
    assert_eq!(message.message_type, MessageType::LeaderboardUpdate);
    let payload: LeaderboardUpdatePayload =
        serde_json::from_value(message.payload).expect("malformed update payload");
    payload.entries
}

/// Convenience projection for assertions.
pub fn as_rank_tuples(entries: &[RankedEntry]) -> Vec<(String, u32, i64)> {
    entries
        .iter()
        .map(|e| (e.user_id.clone(), e.rank, e.total_points))
        .collect()
}
