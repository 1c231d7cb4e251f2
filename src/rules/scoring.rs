//! Points and victory.
//!
//! A side scores when it drives one of the opponent's stats to 0 or
//! below, and again when the opponent stays with both stats negative for
//! too many consecutive checks. Depletion is edge-triggered: a stat that
//! stays depleted scores once, and can score again only after it has
//! recovered above 0.

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{Character, MatchConfig, Side, SideMap, Stat};

/// Why a point was awarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreReason {
    Depleted(Stat),
    /// Both stats negative for `negative_turn_limit` checks in a row.
    ProlongedConfusion,
}

/// A point awarded to `scorer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub scorer: Side,
    pub reason: ScoreReason,
}

impl fmt::Display for ScoreEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lead = match self.scorer {
            Side::Player => "You light a point!",
            Side::Enemy => "The Skeptic lights a point!",
        };
        match self.reason {
            ScoreReason::Depleted(Stat::Logic) => write!(f, "{lead} Logic exhausted."),
            ScoreReason::Depleted(Stat::Emotion) => write!(f, "{lead} Emotions exhausted."),
            ScoreReason::ProlongedConfusion => {
                write!(f, "{lead} The opponent has been confused for too long!")
            }
        }
    }
}

/// Scoring thresholds for a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scoring {
    pub points_to_win: u32,
    pub negative_turn_limit: u32,
}

impl Default for Scoring {
    fn default() -> Self {
        Self::from(&MatchConfig::default())
    }
}

impl From<&MatchConfig> for Scoring {
    fn from(config: &MatchConfig) -> Self {
        Self {
            points_to_win: config.points_to_win,
            negative_turn_limit: config.negative_turn_limit,
        }
    }
}

impl Scoring {
    /// Award points to `winner` for the state `loser` is in.
    ///
    /// Called once per half-turn with the acting side as `winner`.
    pub fn check_points(&self, scorer: Side, winner: &mut Character, loser: &mut Character) -> Vec<ScoreEvent> {
        let mut events = Vec::new();

        for stat in [Stat::Logic, Stat::Emotion] {
            let depleted = match stat {
                Stat::Logic => &mut loser.logic_depleted,
                Stat::Emotion => &mut loser.emotion_depleted,
            };
            let value = match stat {
                Stat::Logic => loser.logic,
                Stat::Emotion => loser.emotion,
            };
            if value <= 0 && !*depleted {
                *depleted = true;
                events.push(ScoreEvent {
                    scorer,
                    reason: ScoreReason::Depleted(stat),
                });
            }
        }

        if loser.logic < 0 && loser.emotion < 0 {
            loser.negative_turns += 1;
            if loser.negative_turns >= self.negative_turn_limit {
                loser.negative_turns = 0;
                events.push(ScoreEvent {
                    scorer,
                    reason: ScoreReason::ProlongedConfusion,
                });
            }
        } else {
            loser.negative_turns = 0;
        }

        if loser.logic > 0 {
            loser.logic_depleted = false;
        }
        if loser.emotion > 0 {
            loser.emotion_depleted = false;
        }

        winner.points += events.len() as u32;
        for event in &events {
            info!("{event}");
        }
        events
    }

    /// The first side, player before enemy, with enough points to win.
    #[must_use]
    pub fn check_victory(&self, sides: &SideMap<Character>) -> Option<Side> {
        Side::BOTH
            .into_iter()
            .find(|&side| sides[side].points >= self.points_to_win)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StartingStats;

    fn pair() -> (Character, Character) {
        (
            Character::new(StartingStats::default()),
            Character::new(StartingStats::default()),
        )
    }

    #[test]
    fn test_depletion_scores_once() {
        let scoring = Scoring::default();
        let (mut winner, mut loser) = pair();
        loser.logic = -5;

        let mut total = 0;
        for _ in 0..5 {
            total += scoring.check_points(Side::Player, &mut winner, &mut loser).len();
        }

        assert_eq!(total, 1);
        assert_eq!(winner.points, 1);
        assert!(loser.logic_depleted);
    }

    #[test]
    fn test_depletion_rearms_after_recovery() {
        let scoring = Scoring::default();
        let (mut winner, mut loser) = pair();

        loser.logic = 0;
        scoring.check_points(Side::Player, &mut winner, &mut loser);
        loser.logic = 1;
        scoring.check_points(Side::Player, &mut winner, &mut loser);
        assert!(!loser.logic_depleted);

        loser.logic = -1;
        let events = scoring.check_points(Side::Player, &mut winner, &mut loser);

        assert_eq!(winner.points, 2);
        assert_eq!(events[0].reason, ScoreReason::Depleted(Stat::Logic));
    }

    #[test]
    fn test_both_stats_deplete_in_one_check() {
        let scoring = Scoring::default();
        let (mut winner, mut loser) = pair();
        loser.logic = 0;
        loser.emotion = 0;

        let events = scoring.check_points(Side::Enemy, &mut winner, &mut loser);

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.scorer == Side::Enemy));
        assert_eq!(winner.points, 2);
    }

    #[test]
    fn test_prolonged_confusion() {
        let scoring = Scoring::default();
        let (mut winner, mut loser) = pair();
        loser.logic = -1;
        loser.emotion = -1;

        scoring.check_points(Side::Player, &mut winner, &mut loser);
        assert_eq!(winner.points, 2);
        assert_eq!(loser.negative_turns, 1);

        scoring.check_points(Side::Player, &mut winner, &mut loser);
        let events = scoring.check_points(Side::Player, &mut winner, &mut loser);

        assert_eq!(events, vec![ScoreEvent { scorer: Side::Player, reason: ScoreReason::ProlongedConfusion }]);
        assert_eq!(winner.points, 3);
        assert_eq!(loser.negative_turns, 0);
    }

    #[test]
    fn test_negative_streak_resets() {
        let scoring = Scoring::default();
        let (mut winner, mut loser) = pair();
        loser.logic = -1;
        loser.emotion = -1;
        scoring.check_points(Side::Player, &mut winner, &mut loser);
        scoring.check_points(Side::Player, &mut winner, &mut loser);

        loser.emotion = 0;
        scoring.check_points(Side::Player, &mut winner, &mut loser);

        assert_eq!(loser.negative_turns, 0);
    }

    #[test]
    fn test_victory() {
        let scoring = Scoring::default();
        let mut sides = SideMap::with_value(Character::new(StartingStats::default()));

        assert_eq!(scoring.check_victory(&sides), None);

        sides[Side::Enemy].points = 3;
        assert_eq!(scoring.check_victory(&sides), Some(Side::Enemy));
    }

    #[test]
    fn test_event_text() {
        let event = ScoreEvent {
            scorer: Side::Player,
            reason: ScoreReason::Depleted(Stat::Logic),
        };
        assert_eq!(event.to_string(), "You light a point! Logic exhausted.");
    }
}
