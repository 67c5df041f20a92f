//! Account reads and seed rotation (§4.J). Seed lookups by a specific
//! historical id fall back to the latest/active one — the storage contract
//! (§4.H) only exposes `latest_user_seed`/`active_server_seed`, not an
//! id-indexed seed history.

use axum::extract::{Path, State};
use axum::Json;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use fairstake_core::model::{Amount, ServerSeed, UserId, UserSeed};
use rand::Rng;
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult, JsonResponse};
use crate::AppState;

type Blake2b256 = Blake2b<U32>;

fn blake2b_hex(material: &str) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update(material.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    id: UserId,
    registration_time: chrono::DateTime<chrono::Utc>,
    username: String,
    user_level: i64,
}

fn parse_user_id(raw: &str) -> ApiResult<UserId> {
    raw.parse::<UserId>().map_err(|_| ApiError::other("bad user id"))
}

pub async fn get_user(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<Json<JsonResponse<PublicUser>>> {
    let user_id = parse_user_id(&user_id)?;
    let user = state
        .storage
        .find_user(user_id)
        .await?
        .ok_or_else(|| ApiError::other("User not found"))?;
    Ok(Json(JsonResponse::ok(PublicUser {
        id: user.id,
        registration_time: user.registration_time,
        username: user.username,
        user_level: user.user_level,
    })))
}

pub async fn get_user_amounts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<JsonResponse<Vec<Amount>>>> {
    let user_id = parse_user_id(&user_id)?;
    let amounts = state.storage.list_amounts(user_id).await?;
    Ok(Json(JsonResponse::ok(amounts)))
}

pub async fn get_latest_games(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<JsonResponse<Vec<String>>>> {
    let user_id = parse_user_id(&user_id)?;
    let bets = state.storage.list_bets_for_user(user_id, 0, 2).await?;
    let mut names = Vec::with_capacity(bets.len());
    for bet in bets {
        if let Some(game) = state.storage.find_game(bet.game_id).await? {
            names.push(game.name);
        }
    }
    Ok(Json(JsonResponse::ok(names)))
}

pub async fn get_user_seed(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<JsonResponse<UserSeed>>> {
    let seed = state
        .storage
        .latest_user_seed(user_id)
        .await?
        .ok_or_else(|| ApiError::other("Error getting user seed"))?;
    Ok(Json(JsonResponse::ok(seed)))
}

pub async fn get_user_seed_by_id(
    auth: AuthUser,
    state: State<AppState>,
    Path(_id): Path<String>,
) -> ApiResult<Json<JsonResponse<UserSeed>>> {
    get_user_seed(auth, state).await
}

pub async fn set_user_seed(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
    Path(new_seed): Path<String>,
) -> ApiResult<Json<JsonResponse<&'static str>>> {
    let hashed = blake2b_hex(&new_seed);
    state.storage.rotate_user_seed(user_id, &hashed).await?;
    Ok(Json(JsonResponse::ok("Seed was added")))
}

pub async fn get_server_seed(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<JsonResponse<ServerSeed>>> {
    let seed = state
        .storage
        .active_server_seed(user_id)
        .await?
        .ok_or_else(|| ApiError::other("Error getting server seed"))?;
    Ok(Json(JsonResponse::ok(seed)))
}

pub async fn get_server_seed_by_id(
    auth: AuthUser,
    state: State<AppState>,
    Path(_id): Path<String>,
) -> ApiResult<Json<JsonResponse<ServerSeed>>> {
    get_server_seed(auth, state).await
}

pub async fn new_server_seed(
    AuthUser(user_id): AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<JsonResponse<String>>> {
    let (a, b) = {
        let mut rng = rand::thread_rng();
        let a: u64 = rng.gen_range(0..1_000_000_000_000_000_000u64);
        let b: u64 = rng.gen_range(0..1_000_000_000_000_000_000u64);
        (a, b)
    };
    let material = format!("{a}{}{b}", state.password_salt);
    let hashed = blake2b_hex(&material);
    state.storage.rotate_server_seed(user_id, &hashed).await?;
    Ok(Json(JsonResponse::ok(hashed)))
}
