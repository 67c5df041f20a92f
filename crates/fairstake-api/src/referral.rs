//! Referral link management (§4.J).

use axum::extract::State;
use axum::Json;
use fairstake_core::model::ReferralLink;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult, JsonResponse};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLinkRequest {
    name: String,
}

pub async fn create_link(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateLinkRequest>,
) -> ApiResult<Json<JsonResponse<&'static str>>> {
    if body.name.is_empty() {
        return Err(ApiError::other("Empty link name submitted"));
    }
    state.storage.create_referral_link(user_id, &body.name).await?;
    Ok(Json(JsonResponse::ok("Link was created")))
}

pub async fn list_links(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<JsonResponse<Vec<ReferralLink>>>> {
    let links = state.storage.list_referral_links_for_user(user_id).await?;
    Ok(Json(JsonResponse::ok(links)))
}
