pub mod engine;
pub mod handlers;
pub mod models;
pub mod scheduler;
pub mod service;
pub mod store;

pub use engine::{RankEngine, RecomputeOutcome};
pub use models::{LeaderboardEntry, RankedEntry};
pub use scheduler::Scheduler;
pub use service::LeaderboardService;
pub use store::{InMemoryScoreStore, PostgresScoreStore, ScoreStore};
