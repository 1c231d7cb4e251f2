//! The two depletable stats and the step tables derived from them.
//!
//! - `logic` drives the hand limit
//! - `emotion` drives the outgoing damage multiplier
//!
//! Multipliers are applied to integer magnitudes and floored *after*
//! multiplication.

use serde::{Deserialize, Serialize};

/// A depletable character stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Logic,
    Emotion,
}

impl Stat {
    /// Wire/catalog name of the stat.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Stat::Logic => "logic",
            Stat::Emotion => "emotion",
        }
    }

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Stat::Logic => Stat::Emotion,
            Stat::Emotion => Stat::Logic,
        }
    }

    /// Parse a catalog effect name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "logic" => Some(Stat::Logic),
            "emotion" => Some(Stat::Emotion),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum hand size for a character with the given logic.
///
/// ```
/// use duelogue::core::stats::hand_limit;
///
/// assert_eq!(hand_limit(0), 3);
/// assert_eq!(hand_limit(5), 6);
/// assert_eq!(hand_limit(7), 7);
/// ```
#[must_use]
pub const fn hand_limit(logic: i32) -> usize {
    match logic {
        i32::MIN..=0 => 3,
        1..=2 => 4,
        3..=4 => 5,
        5..=6 => 6,
        _ => 7,
    }
}

/// Outgoing damage multiplier for a character with the given emotion.
#[must_use]
pub const fn damage_multiplier(emotion: i32) -> f64 {
    match emotion {
        i32::MIN..=0 => 0.5,
        1..=2 => 0.75,
        3..=4 => 1.0,
        5..=6 => 1.25,
        _ => 1.5,
    }
}

/// Multiply an integer magnitude and floor the result.
#[must_use]
pub fn scale(value: i32, factor: f64) -> i32 {
    (f64::from(value) * factor).floor() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_limit_steps() {
        assert_eq!(hand_limit(-10), 3);
        assert_eq!(hand_limit(0), 3);
        assert_eq!(hand_limit(1), 4);
        assert_eq!(hand_limit(2), 4);
        assert_eq!(hand_limit(3), 5);
        assert_eq!(hand_limit(4), 5);
        assert_eq!(hand_limit(5), 6);
        assert_eq!(hand_limit(6), 6);
        assert_eq!(hand_limit(7), 7);
        assert_eq!(hand_limit(100), 7);
    }

    #[test]
    fn test_damage_multiplier_steps() {
        assert_eq!(damage_multiplier(-3), 0.5);
        assert_eq!(damage_multiplier(0), 0.5);
        assert_eq!(damage_multiplier(2), 0.75);
        assert_eq!(damage_multiplier(3), 1.0);
        assert_eq!(damage_multiplier(4), 1.0);
        assert_eq!(damage_multiplier(6), 1.25);
        assert_eq!(damage_multiplier(7), 1.5);
    }

    #[test]
    fn test_scale_floors_after_multiplying() {
        assert_eq!(scale(3, 0.75), 2);
        assert_eq!(scale(5, 1.25), 6);
        assert_eq!(scale(1, 0.5), 0);
        assert_eq!(scale(4, 1.5), 6);
    }

    #[test]
    fn test_stat_parse() {
        assert_eq!(Stat::parse("logic"), Some(Stat::Logic));
        assert_eq!(Stat::parse("emotion"), Some(Stat::Emotion));
        assert_eq!(Stat::parse("random"), None);
        assert_eq!(Stat::Emotion.to_string(), "emotion");
    }
}
