//! The wager engine (components D and E): a one-shot worker and a
//! multi-step worker, each single consumers of their own input channel,
//! talking to storage and the subscription fabric.

mod catalogue;
mod stateful;
mod stateless;
mod request;

pub use catalogue::{Catalogue, CatalogueError};
pub use request::{BetRequest, ContinueGameRequest, StatefulInput, StatelessInput};
pub use stateful::StatefulEngine;
pub use stateless::StatelessEngine;

use std::sync::Arc;

use fairstake_fabric::FabricHandle;
use fairstake_storage::Storage;
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 1024;

/// A cloneable handle sessions use to submit wagers into the engine.
#[derive(Clone)]
pub struct EngineHandle {
    stateless_sender: mpsc::Sender<StatelessInput>,
    stateful_sender: mpsc::Sender<StatefulInput>,
}

impl EngineHandle {
    pub async fn place_bet(&self, bet: BetRequest) {
        if self.stateless_sender.send(StatelessInput::PlaceBet(bet)).await.is_err() {
            tracing::error!("one-shot engine is gone, dropping bet");
        }
    }

    pub async fn continue_game(&self, step: ContinueGameRequest) {
        if self
            .stateful_sender
            .send(StatefulInput::ContinueGame(step))
            .await
            .is_err()
        {
            tracing::error!("multi-step engine is gone, dropping step");
        }
    }
}

/// Spawns the one-shot and multi-step engine workers and returns a handle
/// sessions can submit wagers through.
pub fn spawn(catalogue: Arc<Catalogue>, storage: Arc<dyn Storage>, fabric: FabricHandle) -> EngineHandle {
    let (stateless_tx, stateless_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (stateful_tx, stateful_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let stateless = StatelessEngine::new(
        stateless_rx,
        stateful_tx.clone(),
        catalogue.clone(),
        storage.clone(),
        fabric.clone(),
    );
    let stateful = StatefulEngine::new(stateful_rx, catalogue, storage, fabric);

    tokio::spawn(stateless.run());
    tokio::spawn(stateful.run());

    EngineHandle {
        stateless_sender: stateless_tx,
        stateful_sender: stateful_tx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairstake_core::decimal::dec;
    use fairstake_core::model::{AuthProvider, GameRow};
    use fairstake_storage::memory::MemoryStorage;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn wait_for_settlement(storage: &Arc<dyn Storage>, user_id: fairstake_core::model::UserId) -> fairstake_core::model::BetView {
        timeout(Duration::from_secs(2), async {
            loop {
                let bets = storage.list_bets_for_user(user_id, 0, 10).await.unwrap();
                if let Some(bet) = bets.into_iter().next() {
                    return bet;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("bet should settle before timeout")
    }

    async fn wait_for_state(
        storage: &Arc<dyn Storage>,
        game_id: fairstake_core::model::GameId,
        user_id: fairstake_core::model::UserId,
        coin_id: fairstake_core::model::CoinId,
    ) -> fairstake_core::model::GameState {
        timeout(Duration::from_secs(2), async {
            loop {
                if let Some(state) = storage.get_game_state(game_id, user_id, coin_id).await.unwrap() {
                    return state;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("game state should appear before timeout")
    }

    #[tokio::test]
    async fn a_coinflip_bet_settles_and_credits_profit() {
        let memory = MemoryStorage::new();
        memory.seed_coin(1, "USD", dec("1")).await;
        let user = memory
            .create_user("alice", "alice", "hash", AuthProvider::Local)
            .await
            .unwrap();
        memory.seed_balance(user.id, 1, dec("1000")).await;
        memory.rotate_user_seed(user.id, "client-seed").await.unwrap();
        memory.rotate_server_seed(user.id, "server-hash").await.unwrap();
        memory
            .seed_game(1, "CoinFlip", &serde_json::json!({ "profit_coef": "2" }).to_string())
            .await;

        let catalogue = Arc::new(Catalogue::build(&memory.list_games().await.unwrap()).unwrap());
        let storage: Arc<dyn Storage> = Arc::new(memory);
        let fabric = fairstake_fabric::spawn(vec![1]);
        let handle = spawn(catalogue, storage.clone(), fabric);

        handle
            .place_bet(BetRequest {
                amount: dec("10"),
                num_games: 1,
                uuid: "bet-1".into(),
                data: serde_json::json!({ "is_heads": true }).to_string(),
                game_id: 1,
                user_id: user.id,
                coin_id: 1,
                stop_loss: dec("0"),
                stop_win: dec("0"),
            })
            .await;

        let settled = wait_for_settlement(&storage, user.id).await;
        assert_eq!(settled.game_id, 1);
        assert_eq!(settled.username, "alice");

        let balance = storage.find_amount(user.id, 1).await.unwrap().unwrap();
        // Either the coin landed heads (balance moved to 1020, net +20) or
        // tails (balance moved to 990, net -10) — both are valid outcomes
        // of an undetermined coin flip, so assert the invariant rather
        // than a specific draw.
        assert!(balance.amount == dec("1020") || balance.amount == dec("990"));
    }

    #[tokio::test]
    async fn an_apples_game_opens_state_and_eventually_settles() {
        let memory = MemoryStorage::new();
        memory.seed_coin(1, "USD", dec("1")).await;
        let user = memory
            .create_user("bob", "bob", "hash", AuthProvider::Local)
            .await
            .unwrap();
        memory.seed_balance(user.id, 1, dec("1000")).await;
        memory.rotate_user_seed(user.id, "client-seed").await.unwrap();
        memory.rotate_server_seed(user.id, "server-hash").await.unwrap();

        let difficulties = serde_json::json!([{ "mines": 24, "total_spaces": 25 }]);
        let multipliers = serde_json::json!([["1.1","1.2","1.3","1.4","1.5","1.6","1.7","1.8","1.9","2.0"]]);
        memory
            .seed_game(
                2,
                "Apples",
                &serde_json::json!({ "difficulties": difficulties, "multipliers": multipliers }).to_string(),
            )
            .await;

        let catalogue = Arc::new(Catalogue::build(&memory.list_games().await.unwrap()).unwrap());
        let storage: Arc<dyn Storage> = Arc::new(memory);
        let fabric = fairstake_fabric::spawn(vec![2]);
        let handle = spawn(catalogue, storage.clone(), fabric);

        handle
            .place_bet(BetRequest {
                amount: dec("10"),
                num_games: 1,
                uuid: "bet-2".into(),
                data: serde_json::json!({ "difficulty": 0 }).to_string(),
                game_id: 2,
                user_id: user.id,
                coin_id: 1,
                stop_loss: dec("0"),
                stop_win: dec("0"),
            })
            .await;

        let state = wait_for_state(&storage, 2, user.id, 1).await;
        assert_eq!(state.amount, dec("10"));

        // At 24-of-25 mines density, every pick has only a 1/25 chance of
        // being the row's safe tile, so repeatedly picking tile 0 settles
        // the run (by a mine, almost always on the first try) well within
        // nine rows.
        for _ in 0..9 {
            if storage.get_game_state(2, user.id, 1).await.unwrap().is_none() {
                break;
            }
            handle
                .continue_game(ContinueGameRequest {
                    uuid: "bet-2".into(),
                    data: serde_json::json!({ "tile": 0, "cashout": false }).to_string(),
                    game_id: 2,
                    user_id: user.id,
                    coin_id: 1,
                })
                .await;
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let settled = wait_for_settlement(&storage, user.id).await;
        assert_eq!(settled.game_id, 2);
    }

    #[test]
    fn game_row_is_a_real_fairstake_type() {
        let row = GameRow {
            id: 1,
            name: "CoinFlip".into(),
            parameters: "{}".into(),
        };
        assert_eq!(row.id, 1);
    }
}
