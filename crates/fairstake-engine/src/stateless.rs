//! The one-shot wager worker (§4.D): a single consumer of the bet input
//! channel that settles `OneShotGame`s end to end in one pass.

use std::sync::Arc;

use chrono::Utc;
use fairstake_core::decimal::from_u64;
use fairstake_core::model::BetView;
use fairstake_fabric::FabricHandle;
use fairstake_games::PlayRequest;
use fairstake_storage::{NewBet, Storage};
use tokio::sync::mpsc;

use crate::catalogue::Catalogue;
use crate::request::{BetRequest, StatefulInput, StatelessInput};

const MAX_SUB_GAMES: u64 = 100;
const MAX_STAKE_USD: &str = "50";

pub struct StatelessEngine {
    receiver: mpsc::Receiver<StatelessInput>,
    stateful_sender: mpsc::Sender<StatefulInput>,
    catalogue: Arc<Catalogue>,
    storage: Arc<dyn Storage>,
    fabric: FabricHandle,
}

impl StatelessEngine {
    pub fn new(
        receiver: mpsc::Receiver<StatelessInput>,
        stateful_sender: mpsc::Sender<StatefulInput>,
        catalogue: Arc<Catalogue>,
        storage: Arc<dyn Storage>,
        fabric: FabricHandle,
    ) -> Self {
        Self {
            receiver,
            stateful_sender,
            catalogue,
            storage,
            fabric,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("starting one-shot engine");
        while let Some(input) = self.receiver.recv().await {
            match input {
                // A continuation that arrived on the one-shot channel is
                // forwarded and dropped here rather than also processed as
                // a fresh wager.
                StatelessInput::ContinueGame(step) => {
                    let _ = self.stateful_sender.send(StatefulInput::ContinueGame(step)).await;
                }
                StatelessInput::PlaceBet(bet) => self.handle_bet(bet).await,
            }
        }
        tracing::warn!("one-shot input channel closed, engine exiting");
    }

    async fn handle_bet(&self, bet: BetRequest) {
        if bet.num_games > MAX_SUB_GAMES {
            tracing::warn!(user_id = bet.user_id, num_games = bet.num_games, "rejecting oversized bet");
            return;
        }

        let Some(game) = self.catalogue.one_shot(bet.game_id) else {
            // The stateless catalogue doesn't own this id; hand it to the
            // multi-step engine on the convention that it does.
            let _ = self.stateful_sender.send(StatefulInput::StartGame(bet)).await;
            return;
        };

        let Ok(Some(coin)) = self.storage.find_coin(bet.coin_id).await else {
            tracing::warn!(coin_id = bet.coin_id, "coin not found, dropping bet");
            return;
        };

        let full_stake = &bet.amount * from_u64(bet.num_games);
        let full_stake_usd = &full_stake / &coin.price;
        if full_stake_usd > fairstake_core::decimal::dec(MAX_STAKE_USD) {
            tracing::warn!(user_id = bet.user_id, "rejecting bet over the stake ceiling");
            return;
        }

        let Ok(Some(balance)) = self.storage.find_amount(bet.user_id, bet.coin_id).await else {
            tracing::warn!(user_id = bet.user_id, coin_id = bet.coin_id, "no balance row, dropping bet");
            return;
        };
        if full_stake > balance.amount {
            tracing::warn!(user_id = bet.user_id, "rejecting bet over balance");
            return;
        }

        let Ok(Some(user_seed)) = self.storage.latest_user_seed(bet.user_id).await else {
            tracing::warn!(user_id = bet.user_id, "no user seed, dropping bet");
            return;
        };
        let Ok(Some(server_seed)) = self.storage.active_server_seed(bet.user_id).await else {
            tracing::warn!(user_id = bet.user_id, "no active server seed, dropping bet");
            return;
        };

        let timestamp = Utc::now().timestamp() as u64;
        let count = game.numbers_per_bet() * bet.num_games;
        let random_numbers =
            fairstake_rng::derive_numbers(&user_seed.user_seed, &server_seed.server_seed, timestamp, count);

        let play_request = PlayRequest {
            amount: bet.amount.clone(),
            num_games: bet.num_games,
            stop_win: bet.stop_win.clone(),
            stop_loss: bet.stop_loss.clone(),
            data: bet.data.clone(),
        };

        let result = match game.play(&play_request, &random_numbers) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(user_id = bet.user_id, bet_uuid = %bet.uuid, %err, "bet failed to process");
                return;
            }
        };

        let spent = &bet.amount * from_u64(result.num_games as u64);
        if let Err(err) = self
            .storage
            .sub_inc_balance(bet.user_id, bet.coin_id, &spent, &result.total_profit)
            .await
        {
            tracing::error!(user_id = bet.user_id, %err, "error updating balance");
            return;
        }

        let outcomes = match serde_json::to_string(&result.outcomes) {
            Ok(s) => s,
            Err(err) => {
                tracing::error!(%err, "error marshaling outcomes");
                return;
            }
        };
        let profits = match serde_json::to_string(&result.profits) {
            Ok(s) => s,
            Err(err) => {
                tracing::error!(%err, "error marshaling profits");
                return;
            }
        };

        let settled = match self
            .storage
            .insert_bet(NewBet {
                game_id: bet.game_id,
                user_id: bet.user_id,
                coin_id: bet.coin_id,
                uuid: bet.uuid.clone(),
                amount: full_stake,
                profit: result.total_profit.clone(),
                num_games: result.num_games,
                outcomes: outcomes.clone(),
                profits: profits.clone(),
                bet_info: bet.data.clone(),
                user_seed_id: user_seed.id,
                server_seed_id: server_seed.id,
            })
            .await
        {
            Ok(bet) => bet,
            Err(err) => {
                tracing::error!(user_id = bet.user_id, %err, "error placing bet");
                return;
            }
        };

        let Ok(Some(user)) = self.storage.find_user(bet.user_id).await else {
            tracing::error!(user_id = bet.user_id, "user not found after settling bet");
            return;
        };

        self.fabric
            .propagate_bet(BetView {
                id: settled.id,
                timestamp: settled.timestamp,
                amount: settled.amount,
                profit: settled.profit,
                num_games: settled.num_games,
                outcomes: settled.outcomes,
                profits: settled.profits,
                bet_info: settled.bet_info,
                uuid: settled.uuid,
                game_id: settled.game_id,
                user_id: settled.user_id,
                username: user.username,
                coin_id: settled.coin_id,
                user_seed_id: settled.user_seed_id,
                server_seed_id: settled.server_seed_id,
            })
            .await;
    }
}
