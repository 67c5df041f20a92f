//! The per-connection session loop (§4.G): one task per accepted
//! WebSocket, reading `{method, id, data}` frames and concurrently
//! forwarding whatever the subscription fabric hands back on this
//! connection's feed.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use fairstake_core::model::{CoinId, GameId, UserId};
use fairstake_core::Decimal;
use fairstake_engine::{BetRequest, ContinueGameRequest, EngineHandle};
use fairstake_fabric::{Broadcast, FabricHandle};
use fairstake_storage::Storage;
use futures::{Sink, SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Shared, cloneable handles a session needs; one instance is built once at
/// startup and handed to every accepted connection.
#[derive(Clone)]
pub struct SessionContext {
    pub engine: EngineHandle,
    pub fabric: FabricHandle,
    pub storage: Arc<dyn Storage>,
    pub password_salt: String,
}

#[derive(Debug, Deserialize)]
struct WsRequest {
    method: String,
    #[serde(default)]
    id: u64,
    #[serde(default)]
    data: Value,
}

#[derive(Debug, Serialize)]
struct WsResponse {
    id: u64,
    data: Value,
}

impl WsResponse {
    fn reply(id: u64, data: impl Serialize) -> Self {
        Self {
            id,
            data: serde_json::to_value(data).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireBet {
    amount: Decimal,
    num_games: u64,
    data: String,
    game_id: GameId,
    coin_id: CoinId,
    stop_loss: Decimal,
    stop_win: Decimal,
}

#[derive(Debug, Deserialize)]
struct WireContinue {
    data: String,
    game_id: GameId,
    coin_id: CoinId,
}

#[derive(Debug, Deserialize)]
struct WireGetState {
    game_id: GameId,
    coin_id: CoinId,
}

fn broadcast_to_value(broadcast: Broadcast) -> Value {
    match broadcast {
        Broadcast::NewBet(bet) => serde_json::to_value(bet).unwrap_or(Value::Null),
        Broadcast::StateUpdate(state) => serde_json::to_value(state).unwrap_or(Value::Null),
    }
}

/// Drives one accepted connection until it disconnects. Registers and tears
/// down its fabric feed on the way in and out, so a panic-free exit here is
/// the only thing standing between a client and a leaked feed (§5).
pub async fn run(socket: WebSocket, ctx: SessionContext) {
    let connection_id = Uuid::new_v4().to_string();
    let (mut sink, mut stream) = socket.split();

    if let Err(err) = sink
        .send(Message::Text(
            serde_json::to_string(&WsResponse::reply(0, &connection_id)).unwrap(),
        ))
        .await
    {
        tracing::warn!(connection_id = %connection_id, %err, "failed to send hello, dropping connection");
        return;
    }

    let (feed_tx, mut feed_rx) = tokio::sync::mpsc::channel(fairstake_fabric::DEFAULT_FEED_CAPACITY);
    ctx.fabric.subscribe_feed(connection_id.clone(), feed_tx).await;

    let mut user_id: Option<UserId> = None;

    loop {
        tokio::select! {
            broadcast = feed_rx.recv() => {
                match broadcast {
                    Some(broadcast) => {
                        let response = WsResponse { id: 0, data: broadcast_to_value(broadcast) };
                        if sink.send(Message::Text(serde_json::to_string(&response).unwrap())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            incoming = stream.next() => {
                let Some(incoming) = incoming else { break };
                match incoming {
                    Ok(Message::Text(text)) => {
                        if !handle_message(&text, &connection_id, &ctx, &mut user_id, &mut sink).await {
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(err) => {
                        tracing::warn!(connection_id = %connection_id, %err, "error reading from socket");
                        break;
                    }
                }
            }
        }
    }

    ctx.fabric.unsubscribe_feed(connection_id).await;
}

/// Handles a single client frame. Returns `false` when the connection
/// should be torn down (a send failure on the way out).
async fn handle_message(
    text: &str,
    connection_id: &str,
    ctx: &SessionContext,
    user_id: &mut Option<UserId>,
    sink: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
) -> bool {
    let request: WsRequest = match serde_json::from_str(text) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!(connection_id = %connection_id, %err, "malformed ws frame");
            return true;
        }
    };

    let id = request.id;
    match request.method.as_str() {
        "auth" => {
            let Ok(token) = serde_json::from_value::<String>(request.data) else {
                tracing::warn!(connection_id = %connection_id, "auth frame missing token");
                return true;
            };
            match fairstake_auth::verify_token(&token, &ctx.password_salt) {
                Ok(claims) => match claims.sub.parse::<UserId>() {
                    Ok(parsed) => {
                        *user_id = Some(parsed);
                    }
                    Err(_) => tracing::warn!(connection_id = %connection_id, "auth token subject wasn't a user id"),
                },
                Err(err) => tracing::warn!(connection_id = %connection_id, %err, "auth failed"),
            }
            true
        }
        "subscribe_bets" => {
            if let Ok(games) = serde_json::from_value::<Vec<GameId>>(request.data) {
                ctx.fabric.subscribe_bets(connection_id.to_string(), &games).await;
            }
            true
        }
        "unsubscribe_bets" => {
            if let Ok(games) = serde_json::from_value::<Vec<GameId>>(request.data) {
                ctx.fabric.unsubscribe_bets(connection_id.to_string(), &games).await;
            }
            true
        }
        "subscribe_all_bets" => {
            ctx.fabric.subscribe_all_bets(connection_id.to_string()).await;
            true
        }
        "unsubscribe_all_bets" => {
            ctx.fabric.unsubscribe_all_bets(connection_id.to_string()).await;
            true
        }
        "make_bet" => {
            let Some(user_id) = *user_id else {
                tracing::warn!(connection_id = %connection_id, "make_bet before auth, dropping");
                return true;
            };
            let Ok(wire) = serde_json::from_value::<WireBet>(request.data) else {
                tracing::warn!(connection_id = %connection_id, "malformed make_bet frame");
                return true;
            };
            ctx.engine
                .place_bet(BetRequest {
                    amount: wire.amount,
                    num_games: wire.num_games,
                    uuid: connection_id.to_string(),
                    data: wire.data,
                    game_id: wire.game_id,
                    user_id,
                    coin_id: wire.coin_id,
                    stop_loss: wire.stop_loss,
                    stop_win: wire.stop_win,
                })
                .await;
            true
        }
        "continue_game" => {
            let Some(user_id) = *user_id else {
                tracing::warn!(connection_id = %connection_id, "continue_game before auth, dropping");
                return true;
            };
            let Ok(wire) = serde_json::from_value::<WireContinue>(request.data) else {
                tracing::warn!(connection_id = %connection_id, "malformed continue_game frame");
                return true;
            };
            ctx.engine
                .continue_game(ContinueGameRequest {
                    uuid: connection_id.to_string(),
                    data: wire.data,
                    game_id: wire.game_id,
                    user_id,
                    coin_id: wire.coin_id,
                })
                .await;
            true
        }
        "get_state" => {
            let Some(user_id) = *user_id else {
                tracing::warn!(connection_id = %connection_id, "get_state before auth, dropping");
                return true;
            };
            let Ok(wire) = serde_json::from_value::<WireGetState>(request.data) else {
                tracing::warn!(connection_id = %connection_id, "malformed get_state frame");
                return true;
            };
            let state = ctx
                .storage
                .get_game_state(wire.game_id, user_id, wire.coin_id)
                .await
                .unwrap_or(None);
            let response = WsResponse::reply(id, &state);
            send(sink, connection_id, response).await
        }
        "get_uuid" => {
            let response = WsResponse::reply(id, connection_id);
            send(sink, connection_id, response).await
        }
        other => {
            tracing::warn!(connection_id = %connection_id, method = other, "unknown ws method");
            true
        }
    }
}

async fn send(
    sink: &mut (impl Sink<Message, Error = axum::Error> + Unpin),
    connection_id: &str,
    response: WsResponse,
) -> bool {
    let Ok(text) = serde_json::to_string(&response) else {
        return true;
    };
    if sink.send(Message::Text(text)).await.is_err() {
        tracing::warn!(connection_id = %connection_id, "send failed, closing session");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairstake_core::decimal::dec;
    use fairstake_core::model::BetView;

    fn sample_bet() -> BetView {
        BetView {
            id: 1,
            timestamp: chrono_now(),
            amount: dec("1"),
            profit: dec("2"),
            num_games: 1,
            outcomes: "[]".into(),
            profits: "[]".into(),
            bet_info: "{}".into(),
            uuid: "uuid".into(),
            game_id: 1,
            user_id: 1,
            username: "alice".into(),
            coin_id: 1,
            user_seed_id: 1,
            server_seed_id: 1,
        }
    }

    fn chrono_now() -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(0, 0).unwrap()
    }

    #[test]
    fn new_bet_broadcast_serialises_to_the_bet_view() {
        let value = broadcast_to_value(Broadcast::NewBet(sample_bet()));
        assert_eq!(value["username"], "alice");
        assert_eq!(value["game_id"], 1);
    }

    #[test]
    fn ws_request_parses_the_wire_shape() {
        let request: WsRequest = serde_json::from_str(r#"{"method":"get_uuid","id":7,"data":null}"#).unwrap();
        assert_eq!(request.method, "get_uuid");
        assert_eq!(request.id, 7);
    }

    #[test]
    fn wire_bet_parses_decimal_fields() {
        let wire: WireBet = serde_json::from_value(serde_json::json!({
            "amount": "10.5",
            "num_games": 1,
            "data": "{}",
            "game_id": 1,
            "coin_id": 1,
            "stop_loss": "0",
            "stop_win": "0"
        }))
        .unwrap();
        assert_eq!(wire.amount, dec("10.5"));
    }
}
