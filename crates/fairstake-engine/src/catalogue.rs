//! Builds the live game catalogue from the rows storage hands back at
//! startup. Mirrors the source's name-keyed switch, but spans every
//! variant (the source only wired CoinFlip and Plinko through this path;
//! the rest lived unreachable behind a `nil, nil` stub).

use std::collections::HashMap;
use std::sync::Arc;

use fairstake_core::model::{GameId, GameRow};
use fairstake_games::{Apples, CoinFlip, Dice, MultiStepGame, OneShotGame, Plinko, Poker, Race, Rocket, Rps, Wheel};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("game {name:?} (id {id}) has malformed parameters: {source}")]
    MalformedParameters {
        id: GameId,
        name: String,
        source: serde_json::Error,
    },
    #[error("unknown game name {0:?}")]
    UnknownGame(String),
}

/// The live set of playable games, split by capability shape. Built once
/// at startup from the game catalogue row set and held behind an `Arc` —
/// the engine workers never mutate it.
pub struct Catalogue {
    one_shot: HashMap<GameId, Arc<dyn OneShotGame + Send + Sync>>,
    multi_step: HashMap<GameId, Arc<dyn MultiStepGame + Send + Sync>>,
}

impl Catalogue {
    pub fn build(rows: &[GameRow]) -> Result<Self, CatalogueError> {
        let mut one_shot: HashMap<GameId, Arc<dyn OneShotGame + Send + Sync>> = HashMap::new();
        let mut multi_step: HashMap<GameId, Arc<dyn MultiStepGame + Send + Sync>> = HashMap::new();

        for row in rows {
            match row.name.as_str() {
                "CoinFlip" => {
                    one_shot.insert(row.id, Arc::new(parse::<CoinFlip>(row)?));
                }
                "Dice" => {
                    one_shot.insert(row.id, Arc::new(Dice));
                }
                "Rocket" => {
                    one_shot.insert(row.id, Arc::new(Rocket));
                }
                "Race" => {
                    one_shot.insert(row.id, Arc::new(parse::<Race>(row)?));
                }
                "RPS" => {
                    one_shot.insert(row.id, Arc::new(parse::<Rps>(row)?));
                }
                "Wheel" => {
                    one_shot.insert(row.id, Arc::new(parse::<Wheel>(row)?));
                }
                "Plinko" => {
                    one_shot.insert(row.id, Arc::new(parse::<Plinko>(row)?));
                }
                "Poker" => {
                    multi_step.insert(row.id, Arc::new(parse::<Poker>(row)?));
                }
                "Apples" => {
                    multi_step.insert(row.id, Arc::new(parse::<Apples>(row)?));
                }
                other => return Err(CatalogueError::UnknownGame(other.to_string())),
            }
        }

        Ok(Self { one_shot, multi_step })
    }

    pub fn one_shot(&self, id: GameId) -> Option<&(dyn OneShotGame + Send + Sync)> {
        self.one_shot.get(&id).map(|g| g.as_ref())
    }

    pub fn multi_step(&self, id: GameId) -> Option<&(dyn MultiStepGame + Send + Sync)> {
        self.multi_step.get(&id).map(|g| g.as_ref())
    }
}

fn parse<T: for<'de> serde::Deserialize<'de>>(row: &GameRow) -> Result<T, CatalogueError> {
    serde_json::from_str(&row.parameters).map_err(|source| CatalogueError::MalformedParameters {
        id: row.id,
        name: row.name.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_one_shot_and_a_multi_step_game() {
        let rows = vec![
            GameRow {
                id: 1,
                name: "CoinFlip".into(),
                parameters: serde_json::json!({ "profit_coef": "2" }).to_string(),
            },
            GameRow {
                id: 2,
                name: "Apples".into(),
                parameters: serde_json::json!({
                    "difficulties": [{"mines": 1, "total_spaces": 5}],
                    "multipliers": [["1.1","1.2","1.3","1.4","1.5","1.6","1.7","1.8","1.9","2.0"]],
                })
                .to_string(),
            },
        ];
        let catalogue = Catalogue::build(&rows).unwrap();
        assert!(catalogue.one_shot(1).is_some());
        assert!(catalogue.multi_step(2).is_some());
        assert!(catalogue.one_shot(2).is_none());
    }

    #[test]
    fn rejects_an_unknown_game_name() {
        let rows = vec![GameRow {
            id: 9,
            name: "Roulette".into(),
            parameters: "{}".into(),
        }];
        assert!(matches!(Catalogue::build(&rows), Err(CatalogueError::UnknownGame(_))));
    }
}
