use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use strum_macros::Display;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::messages::WebSocketMessage;
use crate::leaderboard::models::RankedEntry;

/// Lifecycle of a viewer connection. `Disconnected` is terminal; a viewer
/// that comes back is a brand new `Connecting` registration.
#[derive(Debug, Clone, Copy, PartialEq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
}

/// Fan-out of leaderboard updates to connected viewers.
///
/// Delivery is best-effort and per-viewer isolated: one severed connection
/// neither blocks nor fails the others, and nothing is retried. A viewer
/// resynchronizes through the snapshot it receives on its next connect.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Register a viewer and immediately send it the current full snapshot,
    /// the baseline all later updates replace. Returns the viewer id.
    async fn on_connect(
        &self,
        sender: mpsc::UnboundedSender<String>,
        snapshot: &[RankedEntry],
    ) -> Uuid;

    /// Drop a viewer from the registry.
    async fn on_disconnect(&self, viewer_id: Uuid);

    /// Push a full-list update to every connected viewer.
    async fn publish_update(&self, entries: &[RankedEntry]);

    /// Number of currently connected viewers.
    async fn viewer_count(&self) -> usize;
}

struct ViewerHandle {
    sender: mpsc::UnboundedSender<String>,
    state: ConnectionState,
}

/// In-memory viewer registry backing the WebSocket endpoint
pub struct InMemoryBroadcaster {
    // viewer id -> outbound channel + connection state
    viewers: Arc<RwLock<HashMap<Uuid, ViewerHandle>>>,
}

impl Default for InMemoryBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroadcaster {
    pub fn new() -> Self {
        Self {
            viewers: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Broadcaster for InMemoryBroadcaster {
    async fn on_connect(
        &self,
        sender: mpsc::UnboundedSender<String>,
        snapshot: &[RankedEntry],
    ) -> Uuid {
        let viewer_id = Uuid::new_v4();
        let mut handle = ViewerHandle {
            sender,
            state: ConnectionState::Connecting,
        };

        let message = WebSocketMessage::leaderboard_update(snapshot.to_vec());
        let serialized = serde_json::to_string(&message).unwrap();

        // The snapshot send is the reconciliation point; only a viewer that
        // received it counts as connected.
        match handle.sender.send(serialized) {
            Ok(()) => {
                handle.state = ConnectionState::Connected;
                self.viewers.write().await.insert(viewer_id, handle);
                info!(viewer_id = %viewer_id, "Viewer connected, snapshot sent");
            }
            Err(_) => {
                handle.state = ConnectionState::Disconnected;
                warn!(
                    viewer_id = %viewer_id,
                    state = %handle.state,
                    "Viewer dropped before snapshot delivery"
                );
            }
        }

        viewer_id
    }

    async fn on_disconnect(&self, viewer_id: Uuid) {
        let mut viewers = self.viewers.write().await;
        if let Some(mut handle) = viewers.remove(&viewer_id) {
            handle.state = ConnectionState::Disconnected;
            info!(viewer_id = %viewer_id, state = %handle.state, "Viewer disconnected");
        }
    }

    async fn publish_update(&self, entries: &[RankedEntry]) {
        let message = WebSocketMessage::leaderboard_update(entries.to_vec());
        let serialized = serde_json::to_string(&message).unwrap();

        let mut severed = Vec::new();
        {
            let viewers = self.viewers.read().await;
            debug!(viewers = viewers.len(), "Publishing leaderboard update");
            for (viewer_id, handle) in viewers.iter() {
                if handle.state != ConnectionState::Connected {
                    continue;
                }
                if handle.sender.send(serialized.clone()).is_err() {
                    // Not retried: the viewer reconciles via snapshot on its
                    // next connect.
                    warn!(viewer_id = %viewer_id, "Send failed, dropping viewer");
                    severed.push(*viewer_id);
                }
            }
        }

        for viewer_id in severed {
            self.on_disconnect(viewer_id).await;
        }
    }

    async fn viewer_count(&self) -> usize {
        self.viewers.read().await.len()
    }
}
