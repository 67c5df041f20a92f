//! The HTTP surface (§4.J): login/registration, account reads, bet and
//! leaderboard history, referral links, and the WebSocket upgrade that
//! hands a connection off to [`fairstake_session`].

mod auth;
mod bets;
mod error;
mod game;
mod general;
mod referral;
mod user;

pub use error::{ApiError, ApiResult, JsonResponse};

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use fairstake_engine::EngineHandle;
use fairstake_fabric::FabricHandle;
use fairstake_storage::Storage;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Everything a handler needs, cloned cheaply (every field is an `Arc` or a
/// `Clone`-able handle) into each request.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub engine: EngineHandle,
    pub fabric: FabricHandle,
    pub password_salt: String,
    pub access_token_validity_secs: u64,
    pub refresh_token_validity_secs: u64,
    pub page_size: i64,
}

/// Builds the full router: every route in §4.J plus the `/game/ws` upgrade.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/refresh/:token", get(auth::refresh))
        .route("/logout/:token", delete(auth::logout))
        .route("/bets/list", get(bets::list_bets))
        .route("/bets/list/:game_name", get(bets::list_bets_for_game))
        .route("/bets/user/:user_id", get(bets::list_user_bets))
        .route("/user/:user_id", get(user::get_user))
        .route("/user/amounts/:user_id", get(user::get_user_amounts))
        .route("/user/latest/:user_id", get(user::get_latest_games))
        .route("/user/userseed", get(user::get_user_seed))
        .route("/user/userseed/:value", get(user::get_user_seed_by_id).post(user::set_user_seed))
        .route("/user/serverseed", get(user::get_server_seed).post(user::new_server_seed))
        .route("/user/serverseed/:id", get(user::get_server_seed_by_id))
        .route("/general/leaderboard/:kind/:window", get(general::leaderboard))
        .route("/ref", post(referral::create_link).get(referral::list_links))
        .route("/game/ws", get(game::upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use fairstake_storage::memory::MemoryStorage;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let engine = fairstake_engine::spawn(
            Arc::new(fairstake_engine::Catalogue::build(&[]).unwrap()),
            storage.clone(),
            fairstake_fabric::spawn(vec![]),
        );
        AppState {
            fabric: fairstake_fabric::spawn(vec![]),
            engine,
            storage,
            password_salt: "test-salt".into(),
            access_token_validity_secs: 3600,
            refresh_token_validity_secs: 86_400,
            page_size: 10,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn register_then_login_round_trips_credentials() {
        let app = router(test_state());

        let register = Request::builder()
            .method("POST")
            .uri("/register")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"login": "alice", "username": "alice", "password": "hunter2"}).to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(register).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let login = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"login": "alice", "password": "hunter2"}).to_string(),
            ))
            .unwrap();
        let response = app.oneshot(login).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "OK");
        assert!(body["data"]["access_token"].is_string());
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let app = router(test_state());
        let register = Request::builder()
            .method("POST")
            .uri("/register")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"login": "bob", "username": "bob", "password": "hunter2"}).to_string(),
            ))
            .unwrap();
        app.clone().oneshot(register).await.unwrap();

        let login = Request::builder()
            .method("POST")
            .uri("/login")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"login": "bob", "password": "wrong"}).to_string(),
            ))
            .unwrap();
        let response = app.oneshot(login).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_leaderboard_type_is_rejected() {
        let app = router(test_state());
        let request = Request::builder()
            .uri("/general/leaderboard/nonsense/daily")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
