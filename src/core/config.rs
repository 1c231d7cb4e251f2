//! Match and connection configuration.
//!
//! Both structs deserialize from JSON with defaults for any missing
//! field, and expose builder-style `with_*` setters.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::side::{Side, SideMap};

/// Starting stat values for one side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartingStats {
    pub logic: i32,
    pub emotion: i32,
}

impl Default for StartingStats {
    fn default() -> Self {
        Self { logic: 4, emotion: 4 }
    }
}

/// Rules configuration for a single match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Starting stats per side.
    pub starting_stats: SideMap<StartingStats>,

    /// Points needed to win (default: 3).
    pub points_to_win: u32,

    /// Consecutive double-negative observations that award a point (default: 3).
    pub negative_turn_limit: u32,

    /// Probability that a played card grants its target a counter card (default: 0.7).
    pub counter_chance: f64,

    /// Probability that the computer opponent pulls a card back from its
    /// discard pile, flagged `from_discard` (default: 0.0, disabled).
    pub discard_replay_chance: f64,

    /// Hand size below which a discard replay is considered (default: 5).
    pub discard_replay_hand_size: usize,

    /// Probability that the computer opponent spends a held repeat card
    /// instead of dropping it (default: 0.5).
    pub repeat_spend_chance: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            starting_stats: SideMap::with_value(StartingStats::default()),
            points_to_win: 3,
            negative_turn_limit: 3,
            counter_chance: 0.7,
            discard_replay_chance: 0.0,
            discard_replay_hand_size: 5,
            repeat_spend_chance: 0.5,
        }
    }
}

impl MatchConfig {
    /// Set starting stats for one side.
    #[must_use]
    pub fn with_starting_stats(mut self, side: Side, logic: i32, emotion: i32) -> Self {
        self.starting_stats[side] = StartingStats { logic, emotion };
        self
    }

    /// Set the victory threshold.
    #[must_use]
    pub fn with_points_to_win(mut self, points: u32) -> Self {
        self.points_to_win = points;
        self
    }

    /// Set the counter-card grant probability.
    #[must_use]
    pub fn with_counter_chance(mut self, chance: f64) -> Self {
        self.counter_chance = chance;
        self
    }

    /// Set the discard replay probability for the computer opponent.
    #[must_use]
    pub fn with_discard_replay_chance(mut self, chance: f64) -> Self {
        self.discard_replay_chance = chance;
        self
    }

    /// Set the repeat-card spend probability for the computer opponent.
    #[must_use]
    pub fn with_repeat_spend_chance(mut self, chance: f64) -> Self {
        self.repeat_spend_chance = chance;
        self
    }
}

/// Multiplayer connection parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Maximum reconnection attempts before giving up (default: 3).
    pub max_retries: u32,

    /// Delay before the first reconnection attempt, doubled per attempt
    /// (default: 1 s).
    pub retry_delay: Duration,

    /// Interval between `PING`s while open (default: 30 s).
    pub heartbeat_interval: Duration,

    /// How long to wait for a `PONG` (default: 10 s).
    pub heartbeat_timeout: Duration,

    /// How long a connection attempt may stay pending (default: 10 s).
    pub connect_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            heartbeat_interval: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ConnectionConfig {
    /// Set the retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the base retry delay.
    #[must_use]
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set heartbeat interval and timeout.
    #[must_use]
    pub fn with_heartbeat(mut self, interval: Duration, timeout: Duration) -> Self {
        self.heartbeat_interval = interval;
        self.heartbeat_timeout = timeout;
        self
    }

    /// Backoff delay before reconnection attempt `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.retry_delay.saturating_mul(1 << exponent)
    }
}
