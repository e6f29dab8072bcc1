use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::models::RankedEntry;
use crate::shared::{AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateScoreRequest {
    pub total_points: i64,
}

#[derive(Debug, Serialize)]
pub struct UpdateScoreResponse {
    pub user_id: String,
    pub total_points: i64,
}

#[derive(Debug, Serialize)]
pub struct RecomputeResponse {
    pub changed: usize,
}

/// PUT /scores/{user_id}
///
/// Accepts the new accumulated total. Responds once the write is durable;
/// the rank refresh happens behind the caller's back.
pub async fn update_score(
    State(app_state): State<AppState>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateScoreRequest>,
) -> Result<(StatusCode, Json<UpdateScoreResponse>), AppError> {
    if body.total_points < 0 {
        return Err(AppError::Validation(
            "total_points must be non-negative".to_string(),
        ));
    }

    info!(user_id = %user_id, total_points = body.total_points, "Score update received");

    app_state
        .leaderboard_service
        .update_score(&user_id, body.total_points)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(UpdateScoreResponse {
            user_id,
            total_points: body.total_points,
        }),
    ))
}

/// GET /leaderboard
pub async fn get_leaderboard(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<RankedEntry>>, AppError> {
    let entries = app_state.leaderboard_service.ranked_snapshot().await?;
    Ok(Json(entries))
}

/// POST /leaderboard/recompute
///
/// Manual trigger. `changed` is 0 when nothing moved or when the request
/// was absorbed by a recompute already in flight.
pub async fn trigger_recompute(
    State(app_state): State<AppState>,
) -> Result<Json<RecomputeResponse>, AppError> {
    let changed = app_state.leaderboard_service.refresh().await?;
    Ok(Json(RecomputeResponse { changed }))
}
