use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use podium::broadcast::{websocket_handler, Broadcaster, InMemoryBroadcaster};
use podium::config::AppConfig;
use podium::leaderboard::{
    handlers, InMemoryScoreStore, LeaderboardService, PostgresScoreStore, RankEngine, Scheduler,
    ScoreStore,
};
use podium::shared::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "podium=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting podium leaderboard server");

    // Fail fast: an invalid configuration must never reach the scheduler.
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration, refusing to start");
            std::process::exit(1);
        }
    };

    // Score persistence: Postgres when DATABASE_URL is set, in-memory otherwise.
    let store: Arc<dyn ScoreStore> = match &config.database_url {
        Some(url) => {
            let pool = sqlx::PgPool::connect(url)
                .await
                .expect("Failed to connect to database");
            Arc::new(PostgresScoreStore::new(pool))
        }
        None => Arc::new(InMemoryScoreStore::new()),
    };

    // Explicit component instances; the composition root owns every lifecycle.
    let engine = Arc::new(RankEngine::new(store));
    let broadcaster: Arc<dyn Broadcaster> = Arc::new(InMemoryBroadcaster::new());
    let leaderboard_service = Arc::new(LeaderboardService::new(engine, broadcaster.clone()));

    let scheduler = Scheduler::start(leaderboard_service.clone(), config.recompute_interval);

    let app_state = AppState::new(leaderboard_service, broadcaster);

    let app = Router::new()
        .route("/scores/:user_id", put(handlers::update_score))
        .route("/leaderboard", get(handlers::get_leaderboard))
        .route("/leaderboard/recompute", post(handlers::trigger_recompute))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await.unwrap();
    info!(addr = %config.listen_addr, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    // No new ticks after this point; an in-flight recompute runs to completion.
    scheduler.stop().await;
    info!("Shutdown complete");
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
