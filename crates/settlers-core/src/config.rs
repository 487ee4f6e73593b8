//! Rule parameters for one game.

use crate::bank::STANDARD_RESOURCE_COUNT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Seed for board generation, dice and card draws. `None` seeds from the OS.
    pub seed: Option<u64>,
    pub victory_points_to_win: u32,
    /// Seconds a player trade offer stays open.
    pub trade_timeout_secs: u64,
    /// Hands larger than this must discard half on a 7.
    pub discard_threshold: u32,
    pub bank_resource_count: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: None,
            victory_points_to_win: 10,
            trade_timeout_secs: 30,
            discard_threshold: 7,
            bank_resource_count: STANDARD_RESOURCE_COUNT,
        }
    }
}

impl GameConfig {
    /// Default rules with a fixed seed
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub fn trade_timeout(&self) -> Duration {
        Duration::from_secs(self.trade_timeout_secs)
    }
}
