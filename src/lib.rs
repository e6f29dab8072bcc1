// Library crate for the podium leaderboard server
// This file exposes the public API for integration tests

pub mod broadcast;
pub mod config;
pub mod leaderboard;
pub mod shared;

// Re-export commonly used types for easier access in tests
pub use broadcast::{Broadcaster, ConnectionState, InMemoryBroadcaster, MessageType, WebSocketMessage};
pub use config::{AppConfig, ConfigError};
pub use leaderboard::{
    InMemoryScoreStore, LeaderboardEntry, LeaderboardService, RankEngine, RankedEntry,
    RecomputeOutcome, Scheduler, ScoreStore,
};
pub use shared::AppError;
