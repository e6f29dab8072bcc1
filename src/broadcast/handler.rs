use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::shared::{AppError, AppState};

use super::socket::ViewerConnection;

/// WebSocket endpoint for leaderboard viewers
/// GET /ws
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Result<Response, AppError> {
    info!("Viewer WebSocket connection requested");

    // Read the snapshot before upgrading so a store failure surfaces as a
    // plain HTTP error instead of an immediately-dead socket.
    let snapshot = app_state.leaderboard_service.ranked_snapshot().await?;

    Ok(ws.on_upgrade(move |socket| handle_viewer_connection(socket, snapshot, app_state)))
}

/// Handle the upgraded WebSocket connection
async fn handle_viewer_connection(
    socket: axum::extract::ws::WebSocket,
    snapshot: Vec<crate::leaderboard::models::RankedEntry>,
    app_state: AppState,
) {
    // Create the outbound channel (broadcaster -> viewer)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    // Registration sends the snapshot as the viewer's baseline.
    let viewer_id = app_state
        .broadcaster
        .on_connect(outbound_sender, &snapshot)
        .await;

    info!(viewer_id = %viewer_id, "Viewer WebSocket connection established");

    let connection = ViewerConnection::new(viewer_id, Box::new(socket), outbound_receiver);

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(viewer_id = %viewer_id, "Viewer connection closed cleanly");
        }
        Err(e) => {
            warn!(viewer_id = %viewer_id, error = ?e, "Viewer connection error");
        }
    }

    app_state.broadcaster.on_disconnect(viewer_id).await;
}
