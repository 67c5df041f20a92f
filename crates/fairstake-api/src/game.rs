//! The WebSocket upgrade endpoint (§4.J), handing the accepted connection
//! straight off to the session loop (§4.G).

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::State;
use axum::response::Response;
use fairstake_session::SessionContext;

use crate::AppState;

pub async fn upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let ctx = SessionContext {
        engine: state.engine,
        fabric: state.fabric,
        storage: state.storage,
        password_salt: state.password_salt,
    };
    ws.on_upgrade(move |socket| fairstake_session::run(socket, ctx))
}
