//! Login, registration, and refresh-token rotation (§4.I, §4.J).

use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::Json;
use fairstake_auth::Audience;
use fairstake_core::decimal::dec;
use fairstake_core::model::{AuthProvider, UserId};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult, JsonResponse};
use crate::AppState;

/// Extracts and verifies the bearer access token, binding the caller's
/// user id for handlers that require it.
pub struct AuthUser(pub UserId);

#[async_trait::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthenticated("Token is not present"))?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header);

        let claims = fairstake_auth::verify_token(token, &state.password_salt)
            .map_err(|_| ApiError::unauthenticated("Could not verify token"))?;
        fairstake_auth::require_audience(&claims, Audience::Auth)
            .map_err(|_| ApiError::unauthenticated("Malformed token"))?;
        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| ApiError::unauthenticated("bad user id"))?;
        Ok(AuthUser(user_id))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    login: String,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    login: String,
    username: String,
    password: String,
    referral_link: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<JsonResponse<fairstake_auth::Credentials>>> {
    let hashed = fairstake_auth::hash_password(&body.password, &state.password_salt);
    let user = state
        .storage
        .find_user_by_login(&body.login)
        .await?
        .filter(|user| user.password_hash == hashed)
        .ok_or_else(|| ApiError::unauthenticated("Wrong login or password"))?;

    issue_and_persist(&state, user.id).await.map(Json)
}

pub async fn register(State(state): State<AppState>, Json(body): Json<RegisterRequest>) -> ApiResult<Json<JsonResponse<&'static str>>> {
    if body.username.is_empty() {
        return Err(ApiError::other("username is required"));
    }
    if !fairstake_auth::is_valid_identifier(&body.username) {
        return Err(ApiError::other("bad username format"));
    }
    if body.login.is_empty() {
        return Err(ApiError::other("login is required"));
    }
    if !fairstake_auth::is_valid_identifier(&body.login) {
        return Err(ApiError::other("bad login format"));
    }
    if body.password.len() < 6 {
        return Err(ApiError::other("password is too short"));
    }
    if state.storage.find_user_by_login(&body.login).await?.is_some() {
        return Err(ApiError::other("User already exists"));
    }

    let hashed = fairstake_auth::hash_password(&body.password, &state.password_salt);
    let user = state
        .storage
        .create_user(&body.login, &body.username, &hashed, AuthProvider::Local)
        .await?;

    // Two starting balances: a welcome bonus on coin 1, a zero balance on
    // coin 2, matching the fixed starter-coin ids the source hardcodes.
    state.storage.increase_balance(user.id, 2, &dec("0")).await?;
    state.storage.increase_balance(user.id, 1, &dec("1000")).await?;

    if let Some(link_name) = body.referral_link.filter(|link| !link.is_empty()) {
        if let Some(link) = state.storage.find_referral_link_by_name(&link_name).await? {
            state.storage.create_referral(link.refer_to, link.id, user.id).await?;
        }
    }

    Ok(Json(JsonResponse::ok("User was created")))
}

pub async fn refresh(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<JsonResponse<fairstake_auth::Credentials>>> {
    let user_id = revoke_and_identify(&state, &token).await?;
    issue_and_persist(&state, user_id).await.map(Json)
}

pub async fn logout(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<Json<JsonResponse<&'static str>>> {
    revoke_and_identify(&state, &token).await?;
    Ok(Json(JsonResponse::ok("Token has been revoked")))
}

async fn revoke_and_identify(state: &AppState, token: &str) -> ApiResult<UserId> {
    let claims = fairstake_auth::verify_token(token, &state.password_salt)
        .map_err(|_| ApiError::unauthenticated("Could not verify token"))?;
    fairstake_auth::require_audience(&claims, Audience::Refresh)
        .map_err(|_| ApiError::other("Malformed token"))?;
    let user_id = claims
        .sub
        .parse::<UserId>()
        .map_err(|_| ApiError::other("bad user id"))?;
    state.storage.revoke_refresh_token(token).await?;
    Ok(user_id)
}

async fn issue_and_persist(state: &AppState, user_id: UserId) -> ApiResult<JsonResponse<fairstake_auth::Credentials>> {
    let credentials = fairstake_auth::create_credentials(
        &user_id.to_string(),
        "local",
        state.access_token_validity_secs,
        state.refresh_token_validity_secs,
        &state.password_salt,
    )
    .map_err(|_| ApiError::other("Error issuing tokens"))?;
    state
        .storage
        .insert_refresh_token(&credentials.refresh_token, user_id)
        .await?;
    Ok(JsonResponse::ok(credentials))
}
