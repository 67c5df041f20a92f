//! The leaderboard read (§4.J).

use axum::extract::{Path, State};
use axum::Json;
use fairstake_core::model::{LeaderboardEntry, LeaderboardMetric, LeaderboardWindow};

use crate::error::{ApiError, ApiResult, JsonResponse};
use crate::AppState;

fn parse_metric(raw: &str) -> ApiResult<LeaderboardMetric> {
    match raw {
        "volume" => Ok(LeaderboardMetric::Volume),
        "profit" => Ok(LeaderboardMetric::Profit),
        _ => Err(ApiError::other("Unknown leaderboard type")),
    }
}

fn parse_window(raw: &str) -> ApiResult<LeaderboardWindow> {
    match raw {
        "daily" => Ok(LeaderboardWindow::Daily),
        "weekly" => Ok(LeaderboardWindow::Weekly),
        "monthly" => Ok(LeaderboardWindow::Monthly),
        "all" => Ok(LeaderboardWindow::All),
        _ => Err(ApiError::other("No time boundaries present")),
    }
}

pub async fn leaderboard(
    State(state): State<AppState>,
    Path((kind, window)): Path<(String, String)>,
) -> ApiResult<Json<JsonResponse<Vec<LeaderboardEntry>>>> {
    let metric = parse_metric(&kind)?;
    let window = parse_window(&window)?;
    let entries = state.storage.leaderboard(metric, window).await?;
    Ok(Json(JsonResponse::ok(entries)))
}
