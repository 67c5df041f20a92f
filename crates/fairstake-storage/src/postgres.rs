//! The Postgres-backed [`Storage`] implementation. Every balance mutation
//! runs inside a transaction; query text stays close to the original
//! hand-written SQL rather than a query builder, matching how `sqlx` is
//! used elsewhere in the stack.

use async_trait::async_trait;
use fairstake_core::model::{
    Amount, AuthProvider, Bet, BetView, Coin, CoinId, GameId, GameRow, GameState,
    LeaderboardEntry, LeaderboardMetric, LeaderboardWindow, Referral, ReferralLink, ServerSeed,
    User, UserId, UserSeed,
};
use fairstake_core::Decimal;
use sqlx::{PgPool, Row};

use crate::{NewBet, NewGameState, Storage, StorageError, StorageResult};

pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(err: sqlx::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn provider_str(provider: AuthProvider) -> &'static str {
    match provider {
        AuthProvider::Local => "local",
        AuthProvider::Google => "google",
        AuthProvider::Facebook => "facebook",
        AuthProvider::Twitter => "twitter",
    }
}

fn parse_provider(raw: &str) -> AuthProvider {
    match raw {
        "google" => AuthProvider::Google,
        "facebook" => AuthProvider::Facebook,
        "twitter" => AuthProvider::Twitter,
        _ => AuthProvider::Local,
    }
}

fn window_interval(window: LeaderboardWindow) -> Option<&'static str> {
    match window {
        LeaderboardWindow::Daily => Some("1 day"),
        LeaderboardWindow::Weekly => Some("1 week"),
        LeaderboardWindow::Monthly => Some("1 month"),
        LeaderboardWindow::All => None,
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn find_user_by_login(&self, login: &str) -> StorageResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, registration_time, login, username, password, provider, user_level \
             FROM users WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(|row| User {
            id: row.get::<i64, _>("id") as UserId,
            registration_time: row.get("registration_time"),
            login: row.get("login"),
            username: row.get("username"),
            password_hash: row.get("password"),
            provider: parse_provider(row.get("provider")),
            user_level: row.get("user_level"),
        }))
    }

    async fn find_user(&self, user_id: UserId) -> StorageResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, registration_time, login, username, password, provider, user_level \
             FROM users WHERE id = $1",
        )
        .bind(user_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        Ok(row.map(|row| User {
            id: row.get::<i64, _>("id") as UserId,
            registration_time: row.get("registration_time"),
            login: row.get("login"),
            username: row.get("username"),
            password_hash: row.get("password"),
            provider: parse_provider(row.get("provider")),
            user_level: row.get("user_level"),
        }))
    }

    async fn create_user(
        &self,
        login: &str,
        username: &str,
        password_hash: &str,
        provider: AuthProvider,
    ) -> StorageResult<User> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let row = sqlx::query(
            "INSERT INTO users (login, username, password, provider) VALUES ($1, $2, $3, $4) \
             RETURNING id, registration_time, user_level",
        )
        .bind(login)
        .bind(username)
        .bind(password_hash)
        .bind(provider_str(provider))
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        let id: i64 = row.get("id");
        sqlx::query("INSERT INTO amounts (user_id, coin_id, amount) VALUES ($1, 1, 1000), ($1, 2, 0)")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        Ok(User {
            id: id as UserId,
            registration_time: row.get("registration_time"),
            login: login.to_string(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            provider,
            user_level: row.get("user_level"),
        })
    }

    async fn find_coin(&self, coin_id: CoinId) -> StorageResult<Option<Coin>> {
        let row = sqlx::query("SELECT id, name, price FROM coins WHERE id = $1")
            .bind(coin_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(|row| Coin {
            id: row.get::<i64, _>("id") as CoinId,
            name: row.get("name"),
            price: row.get("price"),
        }))
    }

    async fn find_amount(&self, user_id: UserId, coin_id: CoinId) -> StorageResult<Option<Amount>> {
        let row = sqlx::query("SELECT amount FROM amounts WHERE user_id = $1 AND coin_id = $2")
            .bind(user_id as i64)
            .bind(coin_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(|row| Amount {
            user_id,
            coin_id,
            amount: row.get("amount"),
        }))
    }

    async fn list_amounts(&self, user_id: UserId) -> StorageResult<Vec<Amount>> {
        let rows = sqlx::query("SELECT coin_id, amount FROM amounts WHERE user_id = $1")
            .bind(user_id as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows
            .into_iter()
            .map(|row| Amount {
                user_id,
                coin_id: row.get::<i64, _>("coin_id") as CoinId,
                amount: row.get("amount"),
            })
            .collect())
    }

    async fn decrease_balance(
        &self,
        user_id: UserId,
        coin_id: CoinId,
        amount: &Decimal,
    ) -> StorageResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let row = sqlx::query(
            "SELECT amount FROM amounts WHERE user_id = $1 AND coin_id = $2 FOR UPDATE",
        )
        .bind(user_id as i64)
        .bind(coin_id as i64)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or(StorageError::NoBalance { user_id, coin_id })?;

        let balance: Decimal = row.get("amount");
        if amount > &balance {
            return Err(StorageError::InsufficientBalance {
                user_id,
                coin_id,
                amount: amount.clone(),
            });
        }

        sqlx::query("UPDATE amounts SET amount = $1 WHERE user_id = $2 AND coin_id = $3")
            .bind(&balance - amount)
            .bind(user_id as i64)
            .bind(coin_id as i64)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)
    }

    async fn increase_balance(
        &self,
        user_id: UserId,
        coin_id: CoinId,
        amount: &Decimal,
    ) -> StorageResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let row = sqlx::query(
            "SELECT amount FROM amounts WHERE user_id = $1 AND coin_id = $2 FOR UPDATE",
        )
        .bind(user_id as i64)
        .bind(coin_id as i64)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or(StorageError::NoBalance { user_id, coin_id })?;

        let balance: Decimal = row.get("amount");
        sqlx::query("UPDATE amounts SET amount = $1 WHERE user_id = $2 AND coin_id = $3")
            .bind(&balance + amount)
            .bind(user_id as i64)
            .bind(coin_id as i64)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)
    }

    async fn sub_inc_balance(
        &self,
        user_id: UserId,
        coin_id: CoinId,
        sub_amount: &Decimal,
        add_amount: &Decimal,
    ) -> StorageResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let row = sqlx::query(
            "SELECT amount FROM amounts WHERE user_id = $1 AND coin_id = $2 FOR UPDATE",
        )
        .bind(user_id as i64)
        .bind(coin_id as i64)
        .fetch_optional(&mut *tx)
        .await
        .map_err(backend)?
        .ok_or(StorageError::NoBalance { user_id, coin_id })?;

        let balance: Decimal = row.get("amount");
        if sub_amount > &balance {
            return Err(StorageError::InsufficientBalance {
                user_id,
                coin_id,
                amount: sub_amount.clone(),
            });
        }

        let after = &balance - sub_amount + add_amount;
        sqlx::query("UPDATE amounts SET amount = $1 WHERE user_id = $2 AND coin_id = $3")
            .bind(after)
            .bind(user_id as i64)
            .bind(coin_id as i64)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)
    }

    async fn find_game(&self, game_id: GameId) -> StorageResult<Option<GameRow>> {
        let row = sqlx::query("SELECT id, name, parameters FROM games WHERE id = $1")
            .bind(game_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(|row| GameRow {
            id: row.get::<i64, _>("id") as GameId,
            name: row.get("name"),
            parameters: row.get("parameters"),
        }))
    }

    async fn list_games(&self) -> StorageResult<Vec<GameRow>> {
        let rows = sqlx::query("SELECT id, name, parameters FROM games")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows
            .into_iter()
            .map(|row| GameRow {
                id: row.get::<i64, _>("id") as GameId,
                name: row.get("name"),
                parameters: row.get("parameters"),
            })
            .collect())
    }

    async fn latest_user_seed(&self, user_id: UserId) -> StorageResult<Option<UserSeed>> {
        let row = sqlx::query(
            "SELECT id, user_seed, created_at FROM user_seeds WHERE user_id = $1 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(user_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(|row| UserSeed {
            id: row.get::<i64, _>("id") as u64,
            user_id,
            user_seed: row.get("user_seed"),
            created_at: row.get("created_at"),
        }))
    }

    async fn active_server_seed(&self, user_id: UserId) -> StorageResult<Option<ServerSeed>> {
        let row = sqlx::query(
            "SELECT id, server_seed, revealed, created_at FROM server_seeds \
             WHERE user_id = $1 AND revealed = false LIMIT 1",
        )
        .bind(user_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(|row| ServerSeed {
            id: row.get::<i64, _>("id") as u64,
            user_id,
            server_seed: row.get("server_seed"),
            revealed: row.get("revealed"),
            created_at: row.get("created_at"),
        }))
    }

    async fn rotate_server_seed(&self, user_id: UserId, new_hash: &str) -> StorageResult<ServerSeed> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        sqlx::query("UPDATE server_seeds SET revealed = true WHERE user_id = $1 AND revealed = false")
            .bind(user_id as i64)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        let row = sqlx::query(
            "INSERT INTO server_seeds (user_id, server_seed, revealed) VALUES ($1, $2, false) \
             RETURNING id, created_at",
        )
        .bind(user_id as i64)
        .bind(new_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        tx.commit().await.map_err(backend)?;

        Ok(ServerSeed {
            id: row.get::<i64, _>("id") as u64,
            user_id,
            server_seed: new_hash.to_string(),
            revealed: false,
            created_at: row.get("created_at"),
        })
    }

    async fn rotate_user_seed(&self, user_id: UserId, new_seed: &str) -> StorageResult<UserSeed> {
        let row = sqlx::query(
            "INSERT INTO user_seeds (user_id, user_seed) VALUES ($1, $2) RETURNING id, created_at",
        )
        .bind(user_id as i64)
        .bind(new_seed)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(UserSeed {
            id: row.get::<i64, _>("id") as u64,
            user_id,
            user_seed: new_seed.to_string(),
            created_at: row.get("created_at"),
        })
    }

    async fn get_game_state(
        &self,
        game_id: GameId,
        user_id: UserId,
        coin_id: CoinId,
    ) -> StorageResult<Option<GameState>> {
        let row = sqlx::query(
            "SELECT id, timestamp, amount, bet_info, state, uuid, user_seed_id, server_seed_id \
             FROM game_states WHERE game_id = $1 AND user_id = $2 AND coin_id = $3",
        )
        .bind(game_id as i64)
        .bind(user_id as i64)
        .bind(coin_id as i64)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;
        Ok(row.map(|row| GameState {
            id: row.get::<i64, _>("id") as u64,
            timestamp: row.get("timestamp"),
            amount: row.get("amount"),
            bet_info: row.get("bet_info"),
            state: row.get("state"),
            uuid: row.get("uuid"),
            game_id,
            user_id,
            coin_id,
            user_seed_id: row.get::<i64, _>("user_seed_id") as u64,
            server_seed_id: row.get::<i64, _>("server_seed_id") as u64,
        }))
    }

    async fn insert_game_state(&self, state: NewGameState) -> StorageResult<GameState> {
        let row = sqlx::query(
            "INSERT INTO game_states \
             (game_id, user_id, coin_id, uuid, amount, bet_info, state, user_seed_id, server_seed_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING id, timestamp",
        )
        .bind(state.game_id as i64)
        .bind(state.user_id as i64)
        .bind(state.coin_id as i64)
        .bind(&state.uuid)
        .bind(&state.amount)
        .bind(&state.bet_info)
        .bind(&state.state)
        .bind(state.user_seed_id as i64)
        .bind(state.server_seed_id as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(GameState {
            id: row.get::<i64, _>("id") as u64,
            timestamp: row.get("timestamp"),
            amount: state.amount,
            bet_info: state.bet_info,
            state: state.state,
            uuid: state.uuid,
            game_id: state.game_id,
            user_id: state.user_id,
            coin_id: state.coin_id,
            user_seed_id: state.user_seed_id,
            server_seed_id: state.server_seed_id,
        })
    }

    async fn update_game_state(
        &self,
        game_id: GameId,
        user_id: UserId,
        coin_id: CoinId,
        state: &str,
    ) -> StorageResult<()> {
        sqlx::query(
            "UPDATE game_states SET state = $1 WHERE game_id = $2 AND user_id = $3 AND coin_id = $4",
        )
        .bind(state)
        .bind(game_id as i64)
        .bind(user_id as i64)
        .bind(coin_id as i64)
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn remove_game_state(
        &self,
        game_id: GameId,
        user_id: UserId,
        coin_id: CoinId,
    ) -> StorageResult<()> {
        sqlx::query("DELETE FROM game_states WHERE game_id = $1 AND user_id = $2 AND coin_id = $3")
            .bind(game_id as i64)
            .bind(user_id as i64)
            .bind(coin_id as i64)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn insert_bet(&self, bet: NewBet) -> StorageResult<Bet> {
        let row = sqlx::query(
            "INSERT INTO bets \
             (game_id, user_id, coin_id, uuid, amount, profit, num_games, outcomes, profits, bet_info, \
              user_seed_id, server_seed_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING id, timestamp",
        )
        .bind(bet.game_id as i64)
        .bind(bet.user_id as i64)
        .bind(bet.coin_id as i64)
        .bind(&bet.uuid)
        .bind(&bet.amount)
        .bind(&bet.profit)
        .bind(bet.num_games as i32)
        .bind(&bet.outcomes)
        .bind(&bet.profits)
        .bind(&bet.bet_info)
        .bind(bet.user_seed_id as i64)
        .bind(bet.server_seed_id as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(Bet {
            id: row.get::<i64, _>("id") as u64,
            timestamp: row.get("timestamp"),
            amount: bet.amount,
            profit: bet.profit,
            num_games: bet.num_games,
            outcomes: bet.outcomes,
            profits: bet.profits,
            bet_info: bet.bet_info,
            uuid: bet.uuid,
            game_id: bet.game_id,
            user_id: bet.user_id,
            coin_id: bet.coin_id,
            user_seed_id: bet.user_seed_id,
            server_seed_id: bet.server_seed_id,
        })
    }

    async fn list_bets(
        &self,
        game_name: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> StorageResult<Vec<BetView>> {
        let rows = if let Some(name) = game_name {
            sqlx::query(
                "SELECT bets.id, bets.timestamp, bets.amount, bets.profit, bets.num_games, \
                        bets.outcomes, bets.profits, bets.bet_info, bets.uuid, bets.game_id, \
                        bets.user_id, bets.coin_id, bets.user_seed_id, bets.server_seed_id, \
                        users.username \
                 FROM bets \
                 INNER JOIN games ON games.id = bets.game_id \
                 INNER JOIN users ON users.id = bets.user_id \
                 WHERE games.name = $1 \
                 ORDER BY bets.timestamp DESC OFFSET $2 LIMIT $3",
            )
            .bind(name)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query(
                "SELECT bets.id, bets.timestamp, bets.amount, bets.profit, bets.num_games, \
                        bets.outcomes, bets.profits, bets.bet_info, bets.uuid, bets.game_id, \
                        bets.user_id, bets.coin_id, bets.user_seed_id, bets.server_seed_id, \
                        users.username \
                 FROM bets \
                 INNER JOIN users ON users.id = bets.user_id \
                 ORDER BY bets.timestamp DESC OFFSET $1 LIMIT $2",
            )
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
        }
        .map_err(backend)?;

        Ok(rows.into_iter().map(row_to_view).collect())
    }

    async fn list_bets_for_user(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> StorageResult<Vec<BetView>> {
        let rows = sqlx::query(
            "SELECT bets.id, bets.timestamp, bets.amount, bets.profit, bets.num_games, \
                    bets.outcomes, bets.profits, bets.bet_info, bets.uuid, bets.game_id, \
                    bets.user_id, bets.coin_id, bets.user_seed_id, bets.server_seed_id, \
                    users.username \
             FROM bets \
             INNER JOIN users ON users.id = bets.user_id \
             WHERE bets.user_id = $1 \
             ORDER BY bets.timestamp DESC OFFSET $2 LIMIT $3",
        )
        .bind(user_id as i64)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(row_to_view).collect())
    }

    async fn leaderboard(
        &self,
        metric: LeaderboardMetric,
        window: LeaderboardWindow,
    ) -> StorageResult<Vec<LeaderboardEntry>> {
        let interval = window_interval(window);

        // Grouping consistently by `bets.user_id` here, unlike the
        // singular-table-name grouping the source used for its monthly and
        // all-time volume queries — see DESIGN.md.
        let aggregate = match metric {
            LeaderboardMetric::Volume => "SUM((bets.amount * bets.num_games) / coins.price)",
            LeaderboardMetric::Profit => "SUM(bets.profit / coins.price)",
        };

        let query = match interval {
            Some(window) => format!(
                "SELECT totals.user_id, totals.total, users.username FROM ( \
                    SELECT bets.user_id, {aggregate} as total \
                    FROM bets INNER JOIN coins ON coins.id = bets.coin_id \
                    WHERE bets.timestamp > now() - interval '{window}' \
                    GROUP BY bets.user_id) as totals \
                 INNER JOIN users ON users.id = totals.user_id \
                 ORDER BY total DESC LIMIT 20"
            ),
            None => format!(
                "SELECT totals.user_id, totals.total, users.username FROM ( \
                    SELECT bets.user_id, {aggregate} as total \
                    FROM bets INNER JOIN coins ON coins.id = bets.coin_id \
                    GROUP BY bets.user_id) as totals \
                 INNER JOIN users ON users.id = totals.user_id \
                 ORDER BY total DESC LIMIT 20"
            ),
        };

        let rows = sqlx::query(&query).fetch_all(&self.pool).await.map_err(backend)?;
        Ok(rows
            .into_iter()
            .map(|row| LeaderboardEntry {
                user_id: row.get::<i64, _>("user_id") as UserId,
                total: row.get("total"),
                username: row.get("username"),
            })
            .collect())
    }

    async fn insert_refresh_token(&self, token: &str, user_id: UserId) -> StorageResult<()> {
        sqlx::query("INSERT INTO refresh_tokens (token, user_id) VALUES ($1, $2)")
            .bind(token)
            .bind(user_id as i64)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, token: &str) -> StorageResult<Option<UserId>> {
        let row = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1 RETURNING user_id")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(|row| row.get::<i64, _>("user_id") as UserId))
    }

    async fn create_referral_link(
        &self,
        user_id: UserId,
        link_name: &str,
    ) -> StorageResult<ReferralLink> {
        let row = sqlx::query(
            "INSERT INTO referral_links (refer_to, link_name) VALUES ($1, $2) RETURNING id",
        )
        .bind(user_id as i64)
        .bind(link_name)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        Ok(ReferralLink {
            id: row.get::<i64, _>("id") as u64,
            refer_to: user_id,
            link_name: link_name.to_string(),
        })
    }

    async fn find_referral_link_by_name(&self, link_name: &str) -> StorageResult<Option<ReferralLink>> {
        let row = sqlx::query("SELECT id, refer_to FROM referral_links WHERE link_name = $1")
            .bind(link_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        Ok(row.map(|row| ReferralLink {
            id: row.get::<i64, _>("id") as u64,
            refer_to: row.get::<i64, _>("refer_to") as UserId,
            link_name: link_name.to_string(),
        }))
    }

    async fn create_referral(
        &self,
        refer_to: UserId,
        refer_name: u64,
        referral: UserId,
    ) -> StorageResult<Referral> {
        let row = sqlx::query(
            "INSERT INTO referrals (refer_to, refer_name, referral) VALUES ($1, $2, $3) \
             RETURNING id, created_at",
        )
        .bind(refer_to as i64)
        .bind(refer_name as i64)
        .bind(referral as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        Ok(Referral {
            id: row.get::<i64, _>("id") as u64,
            refer_to,
            refer_name,
            referral,
            created_at: row.get("created_at"),
        })
    }

    async fn list_referral_links_for_user(&self, user_id: UserId) -> StorageResult<Vec<ReferralLink>> {
        let rows = sqlx::query("SELECT id, link_name FROM referral_links WHERE refer_to = $1")
            .bind(user_id as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        Ok(rows
            .into_iter()
            .map(|row| ReferralLink {
                id: row.get::<i64, _>("id") as u64,
                refer_to: user_id,
                link_name: row.get("link_name"),
            })
            .collect())
    }
}

fn row_to_view(row: sqlx::postgres::PgRow) -> BetView {
    BetView {
        id: row.get::<i64, _>("id") as u64,
        timestamp: row.get("timestamp"),
        amount: row.get("amount"),
        profit: row.get("profit"),
        num_games: row.get::<i32, _>("num_games") as u32,
        outcomes: row.get("outcomes"),
        profits: row.get("profits"),
        bet_info: row.get("bet_info"),
        uuid: row.get("uuid"),
        game_id: row.get::<i64, _>("game_id") as GameId,
        user_id: row.get::<i64, _>("user_id") as UserId,
        username: row.get("username"),
        coin_id: row.get::<i64, _>("coin_id") as CoinId,
        user_seed_id: row.get::<i64, _>("user_seed_id") as u64,
        server_seed_id: row.get::<i64, _>("server_seed_id") as u64,
    }
}
