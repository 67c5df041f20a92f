//! Paginated bet history reads (§4.J).

use axum::extract::{Path, Query, State};
use axum::Json;
use fairstake_core::model::BetView;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult, JsonResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct OffsetQuery {
    offset: Option<i64>,
}

pub async fn list_bets(State(state): State<AppState>) -> ApiResult<Json<JsonResponse<Vec<BetView>>>> {
    let bets = state.storage.list_bets(None, 0, state.page_size).await?;
    Ok(Json(JsonResponse::ok(bets)))
}

pub async fn list_bets_for_game(
    State(state): State<AppState>,
    Path(game_name): Path<String>,
) -> ApiResult<Json<JsonResponse<Vec<BetView>>>> {
    let bets = state.storage.list_bets(Some(&game_name), 0, state.page_size).await?;
    Ok(Json(JsonResponse::ok(bets)))
}

pub async fn list_user_bets(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<OffsetQuery>,
) -> ApiResult<Json<JsonResponse<Vec<BetView>>>> {
    let user_id = user_id.parse().map_err(|_| ApiError::other("bad user id"))?;
    let offset = query.offset.unwrap_or(0);
    let bets = state
        .storage
        .list_bets_for_user(user_id, offset, state.page_size)
        .await?;
    Ok(Json(JsonResponse::ok(bets)))
}
