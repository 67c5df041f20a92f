//! The multi-step wager worker (§4.E): opens and advances `MultiStepGame`s,
//! persisting interim state between steps.

use std::sync::Arc;

use chrono::Utc;
use fairstake_core::decimal::from_u64;
use fairstake_core::model::BetView;
use fairstake_fabric::FabricHandle;
use fairstake_games::{ContinueRequest, OpenState, PlayRequest};
use fairstake_storage::{NewBet, NewGameState, Storage};
use num_traits::Zero;
use tokio::sync::mpsc;

use crate::catalogue::Catalogue;
use crate::request::{BetRequest, ContinueGameRequest, StatefulInput};

const MAX_SUB_GAMES: u64 = 100;
const MAX_STAKE_USD: &str = "50";

pub struct StatefulEngine {
    receiver: mpsc::Receiver<StatefulInput>,
    catalogue: Arc<Catalogue>,
    storage: Arc<dyn Storage>,
    fabric: FabricHandle,
}

impl StatefulEngine {
    pub fn new(
        receiver: mpsc::Receiver<StatefulInput>,
        catalogue: Arc<Catalogue>,
        storage: Arc<dyn Storage>,
        fabric: FabricHandle,
    ) -> Self {
        Self {
            receiver,
            catalogue,
            storage,
            fabric,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("starting multi-step engine");
        while let Some(input) = self.receiver.recv().await {
            match input {
                StatefulInput::StartGame(bet) => self.handle_start(bet).await,
                StatefulInput::ContinueGame(step) => self.handle_continue(step).await,
            }
        }
        tracing::warn!("multi-step input channel closed, engine exiting");
    }

    async fn handle_start(&self, bet: BetRequest) {
        if bet.num_games > MAX_SUB_GAMES {
            tracing::warn!(user_id = bet.user_id, num_games = bet.num_games, "rejecting oversized bet");
            return;
        }

        let Some(game) = self.catalogue.multi_step(bet.game_id) else {
            tracing::warn!(game_id = bet.game_id, "multi-step game id wasn't found");
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
        let random_numbers = fairstake_rng::derive_numbers(
            &user_seed.user_seed,
            &server_seed.server_seed,
            timestamp,
            game.numbers_per_bet(),
        );

        let play_request = PlayRequest {
            amount: bet.amount.clone(),
            num_games: bet.num_games,
            stop_win: bet.stop_win.clone(),
            stop_loss: bet.stop_loss.clone(),
            data: bet.data.clone(),
        };

        let result = match game.start(&play_request, &random_numbers) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(user_id = bet.user_id, bet_uuid = %bet.uuid, %err, "bet failed to process");
                return;
            }
        };

        // Only the single sub-game's stake is debited here, even when
        // `num_games` requests more than one — the opening step is always
        // one draw; further stakes are implicit in later `continue` calls.
        if let Err(err) = self.storage.decrease_balance(bet.user_id, bet.coin_id, &bet.amount).await {
            tracing::error!(user_id = bet.user_id, %err, "error updating balance");
            return;
        }

        if result.finished {
            self.settle(
                bet.game_id,
                bet.user_id,
                bet.coin_id,
                &bet.uuid,
                full_stake,
                &bet.data,
                user_seed.id,
                server_seed.id,
                &result,
                bet.num_games > 1,
            )
            .await;
        } else {
            self.persist_open_state(
                bet.game_id,
                bet.user_id,
                bet.coin_id,
                &bet.uuid,
                bet.amount.clone(),
                &bet.data,
                user_seed.id,
                server_seed.id,
                &result.data,
            )
            .await;
        }
    }

    async fn handle_continue(&self, step: ContinueGameRequest) {
        let Some(game) = self.catalogue.multi_step(step.game_id) else {
            tracing::warn!(game_id = step.game_id, "multi-step game id wasn't found");
            return;
        };

        let Ok(Some(state)) = self
            .storage
            .get_game_state(step.game_id, step.user_id, step.coin_id)
            .await
        else {
            tracing::warn!(user_id = step.user_id, game_id = step.game_id, "no open game state");
            return;
        };

        let Ok(Some(user_seed)) = self.storage.latest_user_seed(step.user_id).await else {
            tracing::warn!(user_id = step.user_id, "no user seed, dropping step");
            return;
        };
        let Ok(Some(server_seed)) = self.storage.active_server_seed(step.user_id).await else {
            tracing::warn!(user_id = step.user_id, "no active server seed, dropping step");
            return;
        };

        let timestamp = Utc::now().timestamp() as u64;
        let random_numbers = fairstake_rng::derive_numbers(
            &user_seed.user_seed,
            &server_seed.server_seed,
            timestamp,
            game.numbers_per_bet(),
        );

        let open_state = OpenState {
            amount: state.amount.clone(),
            bet_info: state.bet_info.clone(),
            state: state.state.clone(),
        };
        let continue_request = ContinueRequest { data: step.data.clone() };

        let result = match game.continue_game(&open_state, &continue_request, &random_numbers) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(user_id = step.user_id, bet_uuid = %step.uuid, %err, "step failed to process");
                return;
            }
        };

        if result.finished {
            if let Err(err) = self
                .storage
                .remove_game_state(step.game_id, step.user_id, step.coin_id)
                .await
            {
                tracing::error!(user_id = step.user_id, %err, "error removing game state");
                return;
            }
            self.settle(
                step.game_id,
                step.user_id,
                step.coin_id,
                &step.uuid,
                state.amount,
                &step.data,
                user_seed.id,
                server_seed.id,
                &result,
                false,
            )
            .await;
        } else {
            self.persist_open_state(
                step.game_id,
                step.user_id,
                step.coin_id,
                &step.uuid,
                state.amount,
                &step.data,
                user_seed.id,
                server_seed.id,
                &result.data,
            )
            .await;
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn settle(
        &self,
        game_id: fairstake_core::model::GameId,
        user_id: fairstake_core::model::UserId,
        coin_id: fairstake_core::model::CoinId,
        uuid: &str,
        bet_amount: fairstake_core::Decimal,
        bet_info: &str,
        user_seed_id: u64,
        server_seed_id: u64,
        result: &fairstake_games::GameResult,
        remove_stale_state: bool,
    ) {
        if !result.total_profit.is_zero() {
            if let Err(err) = self.storage.increase_balance(user_id, coin_id, &result.total_profit).await {
                tracing::error!(user_id, %err, "error updating balance");
                return;
            }
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
                game_id,
                user_id,
                coin_id,
                uuid: uuid.to_string(),
                amount: bet_amount,
                profit: result.total_profit.clone(),
                num_games: result.num_games,
                outcomes,
                profits,
                bet_info: bet_info.to_string(),
                user_seed_id,
                server_seed_id,
            })
            .await
        {
            Ok(bet) => bet,
            Err(err) => {
                tracing::error!(user_id, %err, "error placing bet");
                return;
            }
        };

        // Defensive: a fresh start that finished immediately shouldn't
        // leave a stale state row behind if one somehow exists.
        if remove_stale_state {
            if let Err(err) = self.storage.remove_game_state(game_id, user_id, coin_id).await {
                tracing::error!(user_id, %err, "error removing game state");
                return;
            }
        }

        let Ok(Some(user)) = self.storage.find_user(user_id).await else {
            tracing::error!(user_id, "user not found after settling bet");
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

    #[allow(clippy::too_many_arguments)]
    async fn persist_open_state(
        &self,
        game_id: fairstake_core::model::GameId,
        user_id: fairstake_core::model::UserId,
        coin_id: fairstake_core::model::CoinId,
        uuid: &str,
        amount: fairstake_core::Decimal,
        bet_info: &str,
        user_seed_id: u64,
        server_seed_id: u64,
        state: &str,
    ) {
        let inserted = self
            .storage
            .insert_game_state(NewGameState {
                game_id,
                user_id,
                coin_id,
                uuid: uuid.to_string(),
                amount,
                bet_info: bet_info.to_string(),
                state: state.to_string(),
                user_seed_id,
                server_seed_id,
            })
            .await;

        let state = match inserted {
            Ok(state) => state,
            Err(err) => {
                tracing::error!(user_id, %err, "error inserting game state");
                return;
            }
        };

        self.fabric.propagate_state(state).await;
    }
}
