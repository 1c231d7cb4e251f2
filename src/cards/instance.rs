//! Card instances - runtime card state.
//!
//! A `CardInstance` is a clone of a template plus the state that changes
//! during play. Gameplay only ever mutates instances; the catalog's
//! templates stay as loaded.
//!
//! Instances serialize to the flat card object with the instance fields
//! (`used`, `fromDiscard`, `currentVariantIndex`, `resolvedStat`) added
//! alongside. That object is the `PLAYER_MOVE` card payload.

use serde::{Deserialize, Serialize};

use super::definition::{CardKind, CardTemplate, Category, RawCard};
use crate::core::error::TemplateError;
use crate::core::Stat;

/// A card in a hand, deck or discard pile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInstance", into = "RawInstance")]
pub struct CardInstance {
    /// The template this card was cloned from.
    pub template: CardTemplate,

    /// Spent: the card leaves the hand after resolution.
    pub used: bool,

    /// Pulled back from a discard pile. Playing it punishes the target
    /// with a repeat card.
    pub from_discard: bool,

    /// Remaining plays, when the template allows more than one.
    pub uses_left: Option<u32>,

    /// Which text variant is shown next.
    pub current_variant_index: usize,

    /// Outcome of the last coin flip this card made during resolution.
    ///
    /// Sent with the move so the remote mirror replays the same outcome.
    pub resolved_stat: Option<Stat>,
}

impl CardInstance {
    /// Clone a template into a fresh, unused instance.
    #[must_use]
    pub fn new(template: CardTemplate) -> Self {
        Self {
            uses_left: template.uses,
            template,
            used: false,
            from_discard: false,
            current_variant_index: 0,
            resolved_stat: None,
        }
    }

    /// Start at a specific text variant (builder pattern).
    #[must_use]
    pub fn with_variant_index(mut self, index: usize) -> Self {
        self.current_variant_index = index;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.template.name
    }

    #[must_use]
    pub fn kind(&self) -> &CardKind {
        &self.template.kind
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.template.category()
    }

    /// Attack damage, 0 for other kinds.
    #[must_use]
    pub fn damage(&self) -> i32 {
        self.template.damage()
    }

    #[must_use]
    pub fn is_repeat(&self) -> bool {
        matches!(self.template.kind, CardKind::Repeat)
    }

    /// Current flavor text.
    #[must_use]
    pub fn text(&self) -> &str {
        self.template.text_at(self.current_variant_index)
    }

    /// Move to the next text variant, wrapping.
    pub fn advance_variant(&mut self) {
        let count = self.template.text_variants.len();
        if count > 0 {
            self.current_variant_index = (self.current_variant_index + 1) % count;
        }
    }

    /// Spend one play.
    ///
    /// Multi-use cards count down and are marked used at zero; single-use
    /// cards are marked used immediately.
    pub fn consume_use(&mut self) {
        match self.uses_left.as_mut() {
            Some(left) => {
                *left = left.saturating_sub(1);
                if *left == 0 {
                    self.used = true;
                }
            }
            None => self.used = true,
        }
    }
}

impl From<CardTemplate> for CardInstance {
    fn from(template: CardTemplate) -> Self {
        Self::new(template)
    }
}

/// Flat wire shape of a [`CardInstance`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstance {
    #[serde(flatten)]
    pub card: RawCard,
    #[serde(default)]
    pub used: bool,
    #[serde(default)]
    pub from_discard: bool,
    #[serde(default)]
    pub current_variant_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_stat: Option<Stat>,
}

impl TryFrom<RawInstance> for CardInstance {
    type Error = TemplateError;

    fn try_from(raw: RawInstance) -> Result<Self, Self::Error> {
        let uses_left = raw.card.uses_left;
        Ok(Self {
            template: CardTemplate::try_from(raw.card)?,
            used: raw.used,
            from_discard: raw.from_discard,
            uses_left,
            current_variant_index: raw.current_variant_index,
            resolved_stat: raw.resolved_stat,
        })
    }
}

impl From<CardInstance> for RawInstance {
    fn from(instance: CardInstance) -> Self {
        let mut card = RawCard::from(instance.template);
        card.uses_left = instance.uses_left;
        Self {
            card,
            used: instance.used,
            from_discard: instance.from_discard,
            current_variant_index: instance.current_variant_index,
            resolved_stat: instance.resolved_stat,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_use_card() {
        let mut card = CardInstance::new(CardTemplate::attack("Jab", Stat::Logic, 2));

        assert!(!card.used);
        card.consume_use();
        assert!(card.used);
    }

    #[test]
    fn test_multi_use_card() {
        let mut card = CardInstance::new(CardTemplate::shield("Wall", 3).with_uses(2));

        card.consume_use();
        assert!(!card.used);
        assert_eq!(card.uses_left, Some(1));

        card.consume_use();
        assert!(card.used);
        assert_eq!(card.uses_left, Some(0));
    }

    #[test]
    fn test_advance_variant_wraps() {
        let template = CardTemplate::cancel("Nope").with_variants(["a", "b", "c"]);
        let mut card = CardInstance::new(template).with_variant_index(2);

        assert_eq!(card.text(), "c");
        card.advance_variant();
        assert_eq!(card.current_variant_index, 0);
        assert_eq!(card.text(), "a");
    }

    #[test]
    fn test_advance_variant_without_variants() {
        let mut card = CardInstance::new(CardTemplate::reflect("Back").with_text("Right back at you."));

        card.advance_variant();
        assert_eq!(card.current_variant_index, 0);
        assert_eq!(card.text(), "Right back at you.");
    }

    #[test]
    fn test_wire_shape() {
        let mut card = CardInstance::new(CardTemplate::random_attack("Wild Guess", 3).with_uses(2));
        card.consume_use();
        card.resolved_stat = Some(Stat::Emotion);

        let value = serde_json::to_value(&card).unwrap();
        assert_eq!(value["name"], "Wild Guess");
        assert_eq!(value["effect"], "random");
        assert_eq!(value["usesLeft"], 1);
        assert_eq!(value["used"], false);
        assert_eq!(value["fromDiscard"], false);
        assert_eq!(value["resolvedStat"], "emotion");

        let back: CardInstance = serde_json::from_value(value).unwrap();
        assert_eq!(back.resolved_stat, Some(Stat::Emotion));
        assert_eq!(back.uses_left, Some(1));
        assert_eq!(back.damage(), 3);
    }

    #[test]
    fn test_accepts_minimal_payload() {
        let card: CardInstance = serde_json::from_str(
            r#"{"name": "Jab", "category": "Атака", "effect": "logic", "damage": 2}"#,
        )
        .unwrap();

        assert!(!card.used);
        assert_eq!(card.current_variant_index, 0);
        assert_eq!(card.category(), Category::Attack);
    }
}
