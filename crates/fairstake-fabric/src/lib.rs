//! The subscription fabric (component F): one actor owning the feed and
//! subscription maps, so no other task ever mutates them directly. The
//! engine tells it what happened; connection sessions tell it who's
//! listening; it is the only thing that writes to a feed channel.

use std::collections::{HashMap, HashSet};

use fairstake_core::model::{BetView, GameId, GameState};
use tokio::sync::mpsc;

const FEED_CAPACITY: usize = 64;

pub type ConnectionId = String;

/// One channel kind a connection can subscribe to. `ChatRoom` and
/// `Invoice` are reserved for future use and are accepted but are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Bets,
    ChatRoom,
    Invoice,
}

#[derive(Debug, Clone)]
pub enum Broadcast {
    NewBet(BetView),
    StateUpdate(GameState),
}

#[derive(Debug)]
pub enum ManagerEvent {
    SubscribeFeed {
        id: ConnectionId,
        feed: mpsc::Sender<Broadcast>,
    },
    UnsubscribeFeed {
        id: ConnectionId,
    },
    SubscribeChannel {
        id: ConnectionId,
        channel_type: ChannelKind,
        channel: GameId,
    },
    UnsubscribeChannel {
        id: ConnectionId,
        channel_type: ChannelKind,
        channel: GameId,
    },
    SubscribeAllBets {
        id: ConnectionId,
    },
    UnsubscribeAllBets {
        id: ConnectionId,
    },
    PropagateBet {
        bet: BetView,
    },
    PropagateState {
        state: GameState,
    },
}

/// A handle sessions and the engine use to talk to the fabric actor.
#[derive(Clone)]
pub struct FabricHandle {
    sender: mpsc::Sender<ManagerEvent>,
}

impl FabricHandle {
    pub async fn send(&self, event: ManagerEvent) {
        if self.sender.send(event).await.is_err() {
            tracing::error!("fabric actor is gone, dropping event");
        }
    }

    /// Registers (or replaces) this connection's outbound feed.
    pub async fn subscribe_feed(&self, id: ConnectionId, feed: mpsc::Sender<Broadcast>) {
        self.send(ManagerEvent::SubscribeFeed { id, feed }).await;
    }

    pub async fn unsubscribe_feed(&self, id: ConnectionId) {
        self.send(ManagerEvent::UnsubscribeFeed { id }).await;
    }

    pub async fn subscribe_bets(&self, id: ConnectionId, games: &[GameId]) {
        for &channel in games {
            self.send(ManagerEvent::SubscribeChannel {
                id: id.clone(),
                channel_type: ChannelKind::Bets,
                channel,
            })
            .await;
        }
    }

    pub async fn unsubscribe_bets(&self, id: ConnectionId, games: &[GameId]) {
        for &channel in games {
            self.send(ManagerEvent::UnsubscribeChannel {
                id: id.clone(),
                channel_type: ChannelKind::Bets,
                channel,
            })
            .await;
        }
    }

    pub async fn subscribe_all_bets(&self, id: ConnectionId) {
        self.send(ManagerEvent::SubscribeAllBets { id }).await;
    }

    pub async fn unsubscribe_all_bets(&self, id: ConnectionId) {
        self.send(ManagerEvent::UnsubscribeAllBets { id }).await;
    }

    pub async fn propagate_bet(&self, bet: BetView) {
        self.send(ManagerEvent::PropagateBet { bet }).await;
    }

    pub async fn propagate_state(&self, state: GameState) {
        self.send(ManagerEvent::PropagateState { state }).await;
    }
}

struct Tables {
    feeds: HashMap<ConnectionId, mpsc::Sender<Broadcast>>,
    bet_subscriptions: HashMap<GameId, HashSet<ConnectionId>>,
}

impl Tables {
    fn new(game_ids: &[GameId]) -> Self {
        let mut bet_subscriptions = HashMap::new();
        for &id in game_ids {
            bet_subscriptions.insert(id, HashSet::new());
        }
        Self {
            feeds: HashMap::new(),
            bet_subscriptions,
        }
    }

    fn clear_memberships(&mut self, id: &ConnectionId) {
        for subs in self.bet_subscriptions.values_mut() {
            subs.remove(id);
        }
    }

    fn process(&mut self, event: ManagerEvent) {
        match event {
            ManagerEvent::SubscribeFeed { id, feed } => {
                if self.feeds.contains_key(&id) {
                    self.clear_memberships(&id);
                }
                self.feeds.insert(id, feed);
            }
            ManagerEvent::UnsubscribeFeed { id } => {
                self.clear_memberships(&id);
                self.feeds.remove(&id);
            }
            ManagerEvent::SubscribeChannel { id, channel_type, channel } => {
                if channel_type == ChannelKind::Bets {
                    self.bet_subscriptions.entry(channel).or_default().insert(id);
                }
            }
            ManagerEvent::UnsubscribeChannel { id, channel_type, channel } => {
                if channel_type == ChannelKind::Bets {
                    if let Some(subs) = self.bet_subscriptions.get_mut(&channel) {
                        subs.remove(&id);
                    }
                }
            }
            ManagerEvent::SubscribeAllBets { id } => {
                for subs in self.bet_subscriptions.values_mut() {
                    subs.insert(id.clone());
                }
            }
            ManagerEvent::UnsubscribeAllBets { id } => {
                self.clear_memberships(&id);
                self.feeds.remove(&id);
            }
            ManagerEvent::PropagateBet { bet } => self.propagate(bet.game_id, Broadcast::NewBet(bet.clone())),
            ManagerEvent::PropagateState { state } => {
                self.propagate(state.game_id, Broadcast::StateUpdate(state.clone()))
            }
        }
    }

    fn propagate(&mut self, game_id: GameId, broadcast: Broadcast) {
        let Some(subs) = self.bet_subscriptions.get(&game_id) else {
            tracing::warn!(game_id, "propagate for unknown game id");
            return;
        };
        for connection_id in subs {
            let Some(feed) = self.feeds.get(connection_id) else {
                tracing::warn!(connection_id = %connection_id, "feed not found for subscriber");
                continue;
            };
            match feed.try_send(broadcast.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(connection_id = %connection_id, "feed full, dropping broadcast");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(connection_id = %connection_id, "feed closed, dropping broadcast");
                }
            }
        }
    }
}

/// Spawns the fabric actor task and returns a cloneable handle to it.
/// `game_ids` seeds one empty subscriber set per known game, mirroring the
/// catalogue known at startup.
pub fn spawn(game_ids: Vec<GameId>) -> FabricHandle {
    let (sender, mut receiver) = mpsc::channel(1024);
    let mut tables = Tables::new(&game_ids);

    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            tables.process(event);
        }
        tracing::info!("fabric actor exiting, sender dropped");
    });

    FabricHandle { sender }
}

pub const DEFAULT_FEED_CAPACITY: usize = FEED_CAPACITY;

#[cfg(test)]
mod tests {
    use super::*;
    use fairstake_core::decimal::dec;
    use std::time::Duration;

    fn sample_bet(game_id: GameId) -> BetView {
        BetView {
            id: 1,
            timestamp: chrono::Utc::now(),
            amount: dec("1"),
            profit: dec("2"),
            num_games: 1,
            outcomes: "[]".into(),
            profits: "[]".into(),
            bet_info: "{}".into(),
            uuid: "uuid".into(),
            game_id,
            user_id: 1,
            username: "alice".into(),
            coin_id: 1,
            user_seed_id: 1,
            server_seed_id: 1,
        }
    }

    #[tokio::test]
    async fn subscribed_connection_receives_propagated_bet() {
        let handle = spawn(vec![1, 2]);
        let (tx, mut rx) = mpsc::channel(DEFAULT_FEED_CAPACITY);
        handle.subscribe_feed("conn-a".into(), tx).await;
        handle.subscribe_bets("conn-a".into(), &[1]).await;

        handle.propagate_bet(sample_bet(1)).await;

        let received = tokio::time::timeout(Duration::from_millis(200), rx.recv())
            .await
            .expect("should receive before timeout")
            .expect("channel open");
        assert!(matches!(received, Broadcast::NewBet(_)));
    }

    #[tokio::test]
    async fn unsubscribed_game_does_not_deliver() {
        let handle = spawn(vec![1, 2]);
        let (tx, mut rx) = mpsc::channel(DEFAULT_FEED_CAPACITY);
        handle.subscribe_feed("conn-a".into(), tx).await;
        handle.subscribe_bets("conn-a".into(), &[1]).await;

        handle.propagate_bet(sample_bet(2)).await;

        let result = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(result.is_err(), "no message should have arrived");
    }

    #[tokio::test]
    async fn resubscribing_feed_clears_prior_memberships() {
        let handle = spawn(vec![1]);
        let (tx_a, mut rx_a) = mpsc::channel(DEFAULT_FEED_CAPACITY);
        handle.subscribe_feed("conn-a".into(), tx_a).await;
        handle.subscribe_bets("conn-a".into(), &[1]).await;

        let (tx_b, _rx_b) = mpsc::channel(DEFAULT_FEED_CAPACITY);
        handle.subscribe_feed("conn-a".into(), tx_b).await;

        handle.propagate_bet(sample_bet(1)).await;
        let result = tokio::time::timeout(Duration::from_millis(50), rx_a.recv()).await;
        assert!(result.is_err(), "old feed should no longer be subscribed");
    }
}
