use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::leaderboard::models::RankedEntry;

/// Message types for viewer-facing WebSocket communication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    // Server -> Client
    LeaderboardUpdate,
}

/// Metadata for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessageMeta {
    pub timestamp: DateTime<Utc>,
}

/// Base structure for WebSocket messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketMessage {
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    pub meta: Option<WebSocketMessageMeta>,
}

/// Payload of a LEADERBOARD_UPDATE message: the complete current ranking.
///
/// Full replacement rather than a diff, so a viewer that missed events is
/// consistent again after any single message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardUpdatePayload {
    pub entries: Vec<RankedEntry>,
}

impl WebSocketMessage {
    pub fn new(message_type: MessageType, payload: serde_json::Value) -> Self {
        Self {
            message_type,
            payload,
            meta: Some(WebSocketMessageMeta {
                timestamp: Utc::now(),
            }),
        }
    }

    /// Create a LEADERBOARD_UPDATE message
    pub fn leaderboard_update(entries: Vec<RankedEntry>) -> Self {
        let payload = LeaderboardUpdatePayload { entries };
        Self::new(
            MessageType::LeaderboardUpdate,
            serde_json::to_value(payload).unwrap(),
        )
    }
}
