//! Card templates - immutable card data loaded from the catalog.
//!
//! The catalog document describes cards as flat JSON objects with a
//! `category` and an `effect` string. Here that pair is parsed once into
//! the closed [`CardKind`] sum, so resolution dispatches with `match`
//! and invalid combinations are rejected at load time.
//!
//! ## Example
//!
//! ```
//! use duelogue::cards::{CardKind, CardTemplate, Category};
//!
//! let card: CardTemplate = serde_json::from_str(r#"{
//!     "name": "Cold Facts",
//!     "category": "Атака",
//!     "effect": "logic",
//!     "damage": 3,
//!     "text": "The numbers speak for themselves."
//! }"#).unwrap();
//!
//! assert_eq!(card.category(), Category::Attack);
//! assert_eq!(card.damage(), 3);
//! ```

use serde::{Deserialize, Serialize};

use crate::core::error::TemplateError;
use crate::core::Stat;

/// Mirror cards without an explicit modifier return this share of the damage.
pub const DEFAULT_MIRROR_MODIFIER: f64 = 0.75;

/// Card category. Accepts the English names and the Russian labels found in older card data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(alias = "Атака")]
    Attack,
    #[serde(alias = "Защита")]
    Defense,
    #[serde(alias = "Уклонение")]
    Evasion,
    /// Cards with no resolution effect (the repeat card).
    #[serde(alias = "Особая")]
    Special,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Category::Attack => "Attack",
            Category::Defense => "Defense",
            Category::Evasion => "Evasion",
            Category::Special => "Special",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stat an attack hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackTarget {
    Stat(Stat),
    /// Coin flip between logic and emotion at resolution time.
    Random,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum DefenseKind {
    /// Restore a stat on the player.
    Heal { stat: Stat, amount: i32 },
    /// Add to the player's shield pool.
    Shield { amount: i32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EvasionKind {
    /// Reverse the opponent's recorded effects.
    Cancel,
    /// Return a share of the opponent's last attack.
    Mirror { modifier: f64 },
    /// Return the opponent's last attack in full.
    Reflect,
}

/// What a card does when played.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CardKind {
    Attack { target: AttackTarget, damage: i32 },
    Defense(DefenseKind),
    Evasion(EvasionKind),
    /// The repeat punishment card. No effect when resolved.
    Repeat,
}

impl CardKind {
    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            CardKind::Attack { .. } => Category::Attack,
            CardKind::Defense(_) => Category::Defense,
            CardKind::Evasion(_) => Category::Evasion,
            CardKind::Repeat => Category::Special,
        }
    }

    /// The stat this card is aligned with, used for logic/emotion weighting.
    ///
    /// `None` for random attacks, shields, evasions and the repeat card.
    #[must_use]
    pub const fn stat(&self) -> Option<Stat> {
        match self {
            CardKind::Attack {
                target: AttackTarget::Stat(stat),
                ..
            }
            | CardKind::Defense(DefenseKind::Heal { stat, .. }) => Some(*stat),
            _ => None,
        }
    }

    /// The wire `effect` tag.
    #[must_use]
    pub const fn effect_name(&self) -> &'static str {
        match self {
            CardKind::Attack {
                target: AttackTarget::Stat(stat),
                ..
            }
            | CardKind::Defense(DefenseKind::Heal { stat, .. }) => stat.as_str(),
            CardKind::Attack {
                target: AttackTarget::Random,
                ..
            } => "random",
            CardKind::Defense(DefenseKind::Shield { .. }) => "shield",
            CardKind::Evasion(EvasionKind::Cancel) => "cancel",
            CardKind::Evasion(EvasionKind::Mirror { .. }) => "mirror",
            CardKind::Evasion(EvasionKind::Reflect) => "reflect",
            CardKind::Repeat => "repeat",
        }
    }
}

/// Immutable card template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCard", into = "RawCard")]
pub struct CardTemplate {
    pub name: String,
    pub kind: CardKind,
    /// Fallback flavor text.
    pub text: String,
    /// Cycled across clones; see `CardCatalog::instantiate`.
    pub text_variants: Vec<String>,
    pub desc: Option<String>,
    /// Number of plays before the card is spent. `None` means one.
    pub uses: Option<u32>,
}

impl CardTemplate {
    /// Create a template with empty text.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: CardKind) -> Self {
        Self {
            name: name.into(),
            kind,
            text: String::new(),
            text_variants: Vec::new(),
            desc: None,
            uses: None,
        }
    }

    /// Attack against a fixed stat.
    #[must_use]
    pub fn attack(name: impl Into<String>, stat: Stat, damage: i32) -> Self {
        Self::new(
            name,
            CardKind::Attack {
                target: AttackTarget::Stat(stat),
                damage,
            },
        )
    }

    /// Attack against a coin-flipped stat.
    #[must_use]
    pub fn random_attack(name: impl Into<String>, damage: i32) -> Self {
        Self::new(
            name,
            CardKind::Attack {
                target: AttackTarget::Random,
                damage,
            },
        )
    }

    #[must_use]
    pub fn heal(name: impl Into<String>, stat: Stat, amount: i32) -> Self {
        Self::new(name, CardKind::Defense(DefenseKind::Heal { stat, amount }))
    }

    #[must_use]
    pub fn shield(name: impl Into<String>, amount: i32) -> Self {
        Self::new(name, CardKind::Defense(DefenseKind::Shield { amount }))
    }

    #[must_use]
    pub fn cancel(name: impl Into<String>) -> Self {
        Self::new(name, CardKind::Evasion(EvasionKind::Cancel))
    }

    #[must_use]
    pub fn mirror(name: impl Into<String>, modifier: f64) -> Self {
        Self::new(name, CardKind::Evasion(EvasionKind::Mirror { modifier }))
    }

    #[must_use]
    pub fn reflect(name: impl Into<String>) -> Self {
        Self::new(name, CardKind::Evasion(EvasionKind::Reflect))
    }

    #[must_use]
    pub fn repeat(name: impl Into<String>) -> Self {
        Self::new(name, CardKind::Repeat)
    }

    /// Set the fallback text (builder pattern).
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the text variants (builder pattern).
    #[must_use]
    pub fn with_variants<I, S>(mut self, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_variants = variants.into_iter().map(Into::into).collect();
        self
    }

    /// Allow several plays (builder pattern).
    #[must_use]
    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses = Some(uses);
        self
    }

    #[must_use]
    pub const fn category(&self) -> Category {
        self.kind.category()
    }

    /// Attack damage, 0 for other kinds.
    #[must_use]
    pub const fn damage(&self) -> i32 {
        match self.kind {
            CardKind::Attack { damage, .. } => damage,
            _ => 0,
        }
    }

    /// Text variant at `index`, falling back to `text`.
    #[must_use]
    pub fn text_at(&self, index: usize) -> &str {
        self.text_variants
            .get(index)
            .filter(|t| !t.is_empty())
            .map_or(self.text.as_str(), String::as_str)
    }

    /// Convert a flat card into the repeat card, whatever category it declares.
    pub(crate) fn repeat_from_raw(raw: RawCard) -> Self {
        Self {
            name: raw.name,
            kind: CardKind::Repeat,
            text: raw.text,
            text_variants: raw.text_variants,
            desc: raw.desc,
            uses: raw.uses_left,
        }
    }
}

// =============================================================================
// Flat wire/catalog shape
// =============================================================================

/// The flat camelCase card object used by catalogs and `PLAYER_MOVE`.
///
/// Only validated once converted into a [`CardTemplate`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCard {
    pub name: String,
    pub category: Option<Category>,
    #[serde(default)]
    pub effect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heal: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shield: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses_left: Option<u32>,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_variants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
}

fn magnitude(name: &str, field: &str, value: Option<i32>) -> Result<i32, TemplateError> {
    match value.unwrap_or(0) {
        v if v < 0 => Err(TemplateError::new(name, format!("`{field}` must not be negative"))),
        v => Ok(v),
    }
}

impl TryFrom<RawCard> for CardTemplate {
    type Error = TemplateError;

    fn try_from(raw: RawCard) -> Result<Self, Self::Error> {
        if raw.name.trim().is_empty() {
            return Err(TemplateError::new(raw.name, "card name is empty"));
        }
        let name = raw.name.as_str();
        let category = raw
            .category
            .ok_or_else(|| TemplateError::new(name, "missing `category`"))?;

        let kind = match (category, raw.effect.as_str()) {
            (Category::Attack, "random") => CardKind::Attack {
                target: AttackTarget::Random,
                damage: magnitude(name, "damage", raw.damage)?,
            },
            (Category::Attack, effect) => match Stat::parse(effect) {
                Some(stat) => CardKind::Attack {
                    target: AttackTarget::Stat(stat),
                    damage: magnitude(name, "damage", raw.damage)?,
                },
                None => {
                    return Err(TemplateError::new(
                        name,
                        format!("attack effect `{effect}` is not logic, emotion or random"),
                    ))
                }
            },
            (Category::Defense, "shield") => CardKind::Defense(DefenseKind::Shield {
                amount: magnitude(name, "shield", raw.shield)?,
            }),
            (Category::Defense, effect) => match Stat::parse(effect) {
                Some(stat) => CardKind::Defense(DefenseKind::Heal {
                    stat,
                    amount: magnitude(name, "heal", raw.heal)?,
                }),
                None => {
                    return Err(TemplateError::new(
                        name,
                        format!("defense effect `{effect}` is not logic, emotion or shield"),
                    ))
                }
            },
            (Category::Evasion, "cancel") => CardKind::Evasion(EvasionKind::Cancel),
            (Category::Evasion, "mirror") => {
                let modifier = raw.modifier.unwrap_or(DEFAULT_MIRROR_MODIFIER);
                if !modifier.is_finite() || modifier < 0.0 {
                    return Err(TemplateError::new(name, "`modifier` must be a non-negative number"));
                }
                CardKind::Evasion(EvasionKind::Mirror { modifier })
            }
            (Category::Evasion, "reflect") => CardKind::Evasion(EvasionKind::Reflect),
            (Category::Special, "repeat") => CardKind::Repeat,
            (category, effect) => {
                return Err(TemplateError::new(
                    name,
                    format!("effect `{effect}` is not valid for a {category} card"),
                ))
            }
        };

        Ok(Self {
            name: raw.name,
            kind,
            text: raw.text,
            text_variants: raw.text_variants,
            desc: raw.desc,
            uses: raw.uses_left,
        })
    }
}

impl From<CardTemplate> for RawCard {
    fn from(template: CardTemplate) -> Self {
        let mut raw = RawCard {
            category: Some(template.kind.category()),
            effect: template.kind.effect_name().to_string(),
            uses_left: template.uses,
            text: template.text,
            text_variants: template.text_variants,
            desc: template.desc,
            name: template.name,
            ..RawCard::default()
        };
        match template.kind {
            CardKind::Attack { damage, .. } => raw.damage = Some(damage),
            CardKind::Defense(DefenseKind::Heal { amount, .. }) => raw.heal = Some(amount),
            CardKind::Defense(DefenseKind::Shield { amount }) => raw.shield = Some(amount),
            CardKind::Evasion(EvasionKind::Mirror { modifier }) => raw.modifier = Some(modifier),
            CardKind::Evasion(_) | CardKind::Repeat => {}
        }
        raw
    }
}
