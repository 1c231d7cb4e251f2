//! Character state: one record per side per match.
//!
//! Every field is always present. Optional state (`shield`, `last_card`,
//! `last_card_effects`) is an `Option` and is reset to `None` rather than
//! removed.
//!
//! Hand, deck and discard pile use `im` persistent vectors so snapshots
//! for multiplayer resync clone in O(1).

use im::Vector;
use serde::{Deserialize, Serialize};

use super::config::StartingStats;
use super::stats::{self, Stat};
use crate::cards::CardInstance;

/// Exactly what an opponent's last card changed on this side's behalf.
///
/// Stored on the character the card acted against, so that character's
/// next Cancel can reverse it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedEffects {
    /// Damage dealt to this character's logic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic_damage: Option<i32>,
    /// Damage dealt to this character's emotion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_damage: Option<i32>,
    /// Logic the opponent healed on itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic_heal: Option<i32>,
    /// Emotion the opponent healed on itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion_heal: Option<i32>,
    /// Shield the opponent raised on itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shield_added: Option<i32>,
}

impl AppliedEffects {
    /// Record stat damage.
    pub fn record_damage(&mut self, stat: Stat, amount: i32) {
        match stat {
            Stat::Logic => self.logic_damage = Some(amount),
            Stat::Emotion => self.emotion_damage = Some(amount),
        }
    }

    /// Record a heal.
    pub fn record_heal(&mut self, stat: Stat, amount: i32) {
        match stat {
            Stat::Logic => self.logic_heal = Some(amount),
            Stat::Emotion => self.emotion_heal = Some(amount),
        }
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One side's complete state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub logic: i32,
    pub emotion: i32,

    /// High-water marks, for display scaling only.
    pub max_logic: i32,
    pub max_emotion: i32,

    pub points: u32,

    /// Edge flags: set when the stat is first seen at or below 0.
    pub logic_depleted: bool,
    pub emotion_depleted: bool,

    /// Consecutive observations with both stats below 0.
    pub negative_turns: u32,

    /// Edge flags for the low-stat defense grant.
    pub logic_negative: bool,
    pub emotion_negative: bool,

    /// Damage absorption pool. Never `Some(n)` with `n <= 0`.
    pub shield: Option<i32>,

    pub hand: Vector<CardInstance>,
    pub deck: Vector<CardInstance>,
    pub discard_pile: Vector<CardInstance>,
    pub discard_count: u32,

    pub last_card: Option<CardInstance>,
    pub last_card_effects: Option<AppliedEffects>,
}

impl Character {
    /// Create a character with the given starting stats and empty card zones.
    #[must_use]
    pub fn new(start: StartingStats) -> Self {
        Self {
            logic: start.logic,
            emotion: start.emotion,
            max_logic: start.logic,
            max_emotion: start.emotion,
            points: 0,
            logic_depleted: false,
            emotion_depleted: false,
            negative_turns: 0,
            logic_negative: false,
            emotion_negative: false,
            shield: None,
            hand: Vector::new(),
            deck: Vector::new(),
            discard_pile: Vector::new(),
            discard_count: 0,
            last_card: None,
            last_card_effects: None,
        }
    }

    // === Stats ===

    /// Current value of a stat.
    #[must_use]
    pub fn stat(&self, stat: Stat) -> i32 {
        match stat {
            Stat::Logic => self.logic,
            Stat::Emotion => self.emotion,
        }
    }

    /// Add `delta` to a stat (negative to damage). Saturates at the `i32`
    /// bounds.
    pub fn modify_stat(&mut self, stat: Stat, delta: i32) {
        let value = match stat {
            Stat::Logic => &mut self.logic,
            Stat::Emotion => &mut self.emotion,
        };
        *value = value.saturating_add(delta);
    }

    /// Raise the high-water marks to the current values.
    pub fn update_watermarks(&mut self) {
        self.max_logic = self.max_logic.max(self.logic);
        self.max_emotion = self.max_emotion.max(self.emotion);
    }

    /// Current hand limit, derived from logic.
    #[must_use]
    pub fn hand_limit(&self) -> usize {
        stats::hand_limit(self.logic)
    }

    /// Current outgoing damage multiplier, derived from emotion.
    #[must_use]
    pub fn damage_multiplier(&self) -> f64 {
        stats::damage_multiplier(self.emotion)
    }

    /// Probability of preferring logic-effect cards: `logic / max(1, logic + emotion)`.
    #[must_use]
    pub fn logic_weight(&self) -> f64 {
        let total = (i64::from(self.logic) + i64::from(self.emotion)).max(1);
        f64::from(self.logic) / total as f64
    }

    // === Shield ===

    /// Current shield, 0 when absent.
    #[must_use]
    pub fn shield_amount(&self) -> i32 {
        self.shield.unwrap_or(0)
    }

    /// Add to the shield pool, dropping it if the result is not positive.
    pub fn adjust_shield(&mut self, delta: i32) {
        let next = self.shield_amount().saturating_add(delta);
        self.shield = (next > 0).then_some(next);
    }

    // === Cards ===

    /// Check whether the hand holds a card with this name.
    #[must_use]
    pub fn has_card(&self, name: &str) -> bool {
        self.hand.iter().any(|c| c.name() == name)
    }

    /// Position of the first card with this name in hand.
    #[must_use]
    pub fn find_in_hand(&self, name: &str) -> Option<usize> {
        self.hand.iter().position(|c| c.name() == name)
    }

    /// Move a card to the discard pile.
    pub fn discard(&mut self, card: CardInstance) {
        self.discard_pile.push_back(card);
        self.discard_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Character {
        Character::new(StartingStats { logic: 4, emotion: 4 })
    }

    #[test]
    fn test_new_character() {
        let c = fresh();

        assert_eq!(c.logic, 4);
        assert_eq!(c.max_emotion, 4);
        assert_eq!(c.points, 0);
        assert!(c.shield.is_none());
        assert!(c.hand.is_empty());
        assert_eq!(c.hand_limit(), 5);
        assert_eq!(c.damage_multiplier(), 1.0);
    }

    #[test]
    fn test_watermarks_only_rise() {
        let mut c = fresh();

        c.modify_stat(Stat::Logic, 3);
        c.update_watermarks();
        assert_eq!(c.max_logic, 7);

        c.modify_stat(Stat::Logic, -10);
        c.update_watermarks();
        assert_eq!(c.logic, -3);
        assert_eq!(c.max_logic, 7);
    }

    #[test]
    fn test_shield_removed_at_zero() {
        let mut c = fresh();

        c.adjust_shield(5);
        assert_eq!(c.shield, Some(5));

        c.adjust_shield(-5);
        assert_eq!(c.shield, None);

        c.adjust_shield(-2);
        assert_eq!(c.shield, None);
    }

    #[test]
    fn test_logic_weight() {
        let mut c = fresh();
        assert_eq!(c.logic_weight(), 0.5);

        c.logic = 0;
        c.emotion = 0;
        assert_eq!(c.logic_weight(), 0.0);

        c.logic = 3;
        c.emotion = 1;
        assert_eq!(c.logic_weight(), 0.75);
    }

    #[test]
    fn test_applied_effects_recording() {
        let mut effects = AppliedEffects::default();
        assert!(effects.is_empty());

        effects.record_damage(Stat::Emotion, 3);
        effects.record_heal(Stat::Logic, 2);

        assert_eq!(effects.emotion_damage, Some(3));
        assert_eq!(effects.logic_heal, Some(2));
        assert!(!effects.is_empty());
    }

    #[test]
    fn test_huge_deltas_saturate() {
        let mut c = fresh();

        c.modify_stat(Stat::Logic, -i32::MAX);
        c.modify_stat(Stat::Logic, -i32::MAX);
        assert_eq!(c.logic, i32::MIN);

        c.modify_stat(Stat::Emotion, i32::MAX);
        assert_eq!(c.emotion, i32::MAX);
        c.logic = i32::MAX;
        assert_eq!(c.logic_weight(), 0.5);

        c.adjust_shield(i32::MAX);
        c.adjust_shield(i32::MAX);
        assert_eq!(c.shield, Some(i32::MAX));
    }
}
