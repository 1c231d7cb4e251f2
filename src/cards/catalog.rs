//! Card catalog - the template pools a match draws from.
//!
//! Loaded once per match from a JSON document:
//!
//! ```json
//! {
//!   "basePlayerCards": [...],
//!   "baseEnemyCards":  [...],
//!   "defenseCards":    [...],
//!   "evasionCards":    [...],
//!   "rareAttackCards": [...],
//!   "specialCards": { "repeatCard": {...} }
//! }
//! ```
//!
//! Missing arrays are empty. Everything else is validated up front and
//! any problem fails the whole load.
//!
//! The only state that changes after loading is the per-template text
//! variant cursor, advanced by [`CardCatalog::instantiate`].

use log::{debug, info};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::cell::RefCell;
use std::io::Read;
use std::path::Path;

use super::definition::{CardTemplate, Category, RawCard};
use super::instance::CardInstance;
use crate::core::error::{CatalogError, TemplateError};
use crate::core::Side;

/// The template pools of a catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pool {
    PlayerAttacks,
    EnemyAttacks,
    Defense,
    Evasion,
    RareAttacks,
}

impl Pool {
    pub const ALL: [Pool; 5] = [
        Pool::PlayerAttacks,
        Pool::EnemyAttacks,
        Pool::Defense,
        Pool::Evasion,
        Pool::RareAttacks,
    ];

    /// Catalog document key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Pool::PlayerAttacks => "basePlayerCards",
            Pool::EnemyAttacks => "baseEnemyCards",
            Pool::Defense => "defenseCards",
            Pool::Evasion => "evasionCards",
            Pool::RareAttacks => "rareAttackCards",
        }
    }

    /// Base attack pool for a side.
    #[must_use]
    pub const fn attacks_for(side: Side) -> Self {
        match side {
            Side::Player => Pool::PlayerAttacks,
            Side::Enemy => Pool::EnemyAttacks,
        }
    }

    const fn category(self) -> Category {
        match self {
            Pool::PlayerAttacks | Pool::EnemyAttacks | Pool::RareAttacks => Category::Attack,
            Pool::Defense => Category::Defense,
            Pool::Evasion => Category::Evasion,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCatalog {
    #[serde(default)]
    base_player_cards: Vec<RawCard>,
    #[serde(default)]
    base_enemy_cards: Vec<RawCard>,
    #[serde(default)]
    defense_cards: Vec<RawCard>,
    #[serde(default)]
    evasion_cards: Vec<RawCard>,
    #[serde(default)]
    rare_attack_cards: Vec<RawCard>,
    #[serde(default)]
    special_cards: RawSpecials,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSpecials {
    #[serde(default)]
    repeat_card: Option<RawCard>,
}

/// Loaded card templates.
///
/// ## Example
///
/// ```
/// use duelogue::cards::CardCatalog;
/// use duelogue::core::Side;
///
/// let catalog = CardCatalog::from_json_str(r#"{
///     "basePlayerCards": [{"name": "Fact", "category": "Attack", "effect": "logic", "damage": 3}],
///     "baseEnemyCards":  [{"name": "Doubt", "category": "Attack", "effect": "emotion", "damage": 2}]
/// }"#).unwrap();
///
/// assert_eq!(catalog.attack_pool(Side::Player)[0].name, "Fact");
/// assert!(catalog.repeat_card().is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardCatalog {
    player_attacks: Vec<CardTemplate>,
    enemy_attacks: Vec<CardTemplate>,
    defense: Vec<CardTemplate>,
    evasion: Vec<CardTemplate>,
    rare_attacks: Vec<CardTemplate>,
    repeat: Option<CardTemplate>,

    /// Next text variant per template name.
    cursors: RefCell<FxHashMap<String, usize>>,
}

impl CardCatalog {
    /// Parse a catalog document.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;
        Self::from_raw(raw)
    }

    /// Parse a catalog document from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    /// Load a catalog document from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let catalog = Self::from_reader(std::io::BufReader::new(file))?;
        info!("loaded card catalog from {}", path.display());
        Ok(catalog)
    }

    fn from_raw(raw: RawCatalog) -> Result<Self, CatalogError> {
        let catalog = Self {
            player_attacks: convert_pool(Pool::PlayerAttacks, raw.base_player_cards)?,
            enemy_attacks: convert_pool(Pool::EnemyAttacks, raw.base_enemy_cards)?,
            defense: convert_pool(Pool::Defense, raw.defense_cards)?,
            evasion: convert_pool(Pool::Evasion, raw.evasion_cards)?,
            rare_attacks: convert_pool(Pool::RareAttacks, raw.rare_attack_cards)?,
            repeat: raw.special_cards.repeat_card.map(CardTemplate::repeat_from_raw),
            cursors: RefCell::default(),
        };

        for side in Side::BOTH {
            if catalog.attack_pool(side).is_empty() {
                return Err(CatalogError::EmptyAttackPool(side));
            }
        }

        debug!(
            "catalog: {} player attacks, {} enemy attacks, {} defense, {} evasion, {} rare, repeat card {}",
            catalog.player_attacks.len(),
            catalog.enemy_attacks.len(),
            catalog.defense.len(),
            catalog.evasion.len(),
            catalog.rare_attacks.len(),
            if catalog.repeat.is_some() { "present" } else { "absent" },
        );
        Ok(catalog)
    }

    // === Pools ===

    /// Templates of one pool.
    #[must_use]
    pub fn pool(&self, pool: Pool) -> &[CardTemplate] {
        match pool {
            Pool::PlayerAttacks => &self.player_attacks,
            Pool::EnemyAttacks => &self.enemy_attacks,
            Pool::Defense => &self.defense,
            Pool::Evasion => &self.evasion,
            Pool::RareAttacks => &self.rare_attacks,
        }
    }

    /// Base attack templates for a side.
    #[must_use]
    pub fn attack_pool(&self, side: Side) -> &[CardTemplate] {
        self.pool(Pool::attacks_for(side))
    }

    #[must_use]
    pub fn defense_cards(&self) -> &[CardTemplate] {
        &self.defense
    }

    #[must_use]
    pub fn evasion_cards(&self) -> &[CardTemplate] {
        &self.evasion
    }

    #[must_use]
    pub fn rare_attack_cards(&self) -> &[CardTemplate] {
        &self.rare_attacks
    }

    #[must_use]
    pub fn repeat_template(&self) -> Option<&CardTemplate> {
        self.repeat.as_ref()
    }

    /// Find a template by name in any pool.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&CardTemplate> {
        Pool::ALL
            .iter()
            .flat_map(|&pool| self.pool(pool))
            .chain(self.repeat.as_ref())
            .find(|t| t.name == name)
    }

    // === Instances ===

    /// Clone a template into a fresh instance.
    ///
    /// The clone starts at the template's current text variant, and the
    /// cursor moves on (wrapping) so the next clone shows the next text.
    #[must_use]
    pub fn instantiate(&self, template: &CardTemplate) -> CardInstance {
        let variants = template.text_variants.len();
        let mut cursors = self.cursors.borrow_mut();
        let cursor = cursors.entry(template.name.clone()).or_insert(0);
        let index = if variants == 0 { 0 } else { *cursor % variants };
        if variants > 0 {
            *cursor = (index + 1) % variants;
        }
        CardInstance::new(template.clone()).with_variant_index(index)
    }

    /// A fresh repeat card, if the catalog defines one.
    #[must_use]
    pub fn repeat_card(&self) -> Option<CardInstance> {
        self.repeat.as_ref().map(|t| self.instantiate(t))
    }

    /// Current text of an instance.
    #[must_use]
    pub fn card_text<'c>(&self, card: &'c CardInstance) -> &'c str {
        card.text()
    }

    /// Reset every text variant cursor.
    pub fn reset_cursors(&self) {
        self.cursors.borrow_mut().clear();
    }
}

fn convert_pool(pool: Pool, raw: Vec<RawCard>) -> Result<Vec<CardTemplate>, CatalogError> {
    let mut templates: Vec<CardTemplate> = Vec::with_capacity(raw.len());
    for card in raw {
        let template = CardTemplate::try_from(card)?;
        if template.category() != pool.category() {
            return Err(TemplateError::new(
                template.name,
                format!("{} card listed in `{}`", template.kind.category(), pool.key()),
            )
            .into());
        }
        if templates.iter().any(|t| t.name == template.name) {
            return Err(CatalogError::DuplicateName {
                name: template.name,
                pool: pool.key(),
            });
        }
        templates.push(template);
    }
    Ok(templates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Stat;

    const CATALOG: &str = r#"{
        "basePlayerCards": [
            {"name": "Fact", "category": "Attack", "effect": "logic", "damage": 3,
             "textVariants": ["one", "two"]},
            {"name": "Feeling", "category": "Attack", "effect": "emotion", "damage": 2}
        ],
        "baseEnemyCards": [
            {"name": "Doubt", "category": "Атака", "effect": "random", "damage": 2}
        ],
        "defenseCards": [
            {"name": "Wall", "category": "Защита", "effect": "shield", "shield": 4}
        ],
        "evasionCards": [
            {"name": "Dodge", "category": "Уклонение", "effect": "cancel"}
        ],
        "specialCards": {
            "repeatCard": {"name": "Повторение", "category": "Уклонение", "effect": "cancel",
                           "text": "You already said that!"}
        }
    }"#;

    #[test]
    fn test_load_pools() {
        let catalog = CardCatalog::from_json_str(CATALOG).unwrap();

        assert_eq!(catalog.attack_pool(Side::Player).len(), 2);
        assert_eq!(catalog.attack_pool(Side::Enemy).len(), 1);
        assert_eq!(catalog.defense_cards().len(), 1);
        assert!(catalog.rare_attack_cards().is_empty());
        assert!(catalog.find("Wall").is_some());
        assert!(catalog.find("Nothing").is_none());
    }

    #[test]
    fn test_repeat_card_is_special() {
        let catalog = CardCatalog::from_json_str(CATALOG).unwrap();
        let repeat = catalog.repeat_card().unwrap();

        assert!(repeat.is_repeat());
        assert_eq!(repeat.category(), Category::Special);
        assert_eq!(repeat.text(), "You already said that!");
    }

    #[test]
    fn test_instantiate_cycles_variants() {
        let catalog = CardCatalog::from_json_str(CATALOG).unwrap();
        let fact = &catalog.attack_pool(Side::Player)[0];

        let first = catalog.instantiate(fact);
        let second = catalog.instantiate(fact);
        let third = catalog.instantiate(fact);

        assert_eq!(first.text(), "one");
        assert_eq!(second.text(), "two");
        assert_eq!(third.text(), "one");
    }

    #[test]
    fn test_instantiate_leaves_template_untouched() {
        let catalog = CardCatalog::from_json_str(CATALOG).unwrap();
        let before = catalog.attack_pool(Side::Player)[0].clone();

        let mut card = catalog.instantiate(&catalog.attack_pool(Side::Player)[0]);
        card.consume_use();
        card.template.kind = crate::cards::CardKind::Attack {
            target: crate::cards::AttackTarget::Stat(Stat::Logic),
            damage: 99,
        };

        assert_eq!(catalog.attack_pool(Side::Player)[0], before);
    }

    #[test]
    fn test_missing_arrays_default_empty() {
        let catalog = CardCatalog::from_json_str(
            r#"{
                "basePlayerCards": [{"name": "A", "category": "Attack", "effect": "logic", "damage": 1}],
                "baseEnemyCards": [{"name": "B", "category": "Attack", "effect": "logic", "damage": 1}]
            }"#,
        )
        .unwrap();

        assert!(catalog.defense_cards().is_empty());
        assert!(catalog.evasion_cards().is_empty());
        assert!(catalog.repeat_template().is_none());
    }

    #[test]
    fn test_empty_attack_pool_rejected() {
        let err = CardCatalog::from_json_str(
            r#"{"basePlayerCards": [{"name": "A", "category": "Attack", "effect": "logic"}]}"#,
        )
        .unwrap_err();

        assert!(matches!(err, CatalogError::EmptyAttackPool(Side::Enemy)));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = CardCatalog::from_json_str(
            r#"{
                "basePlayerCards": [
                    {"name": "A", "category": "Attack", "effect": "logic"},
                    {"name": "A", "category": "Attack", "effect": "emotion"}
                ],
                "baseEnemyCards": [{"name": "B", "category": "Attack", "effect": "logic"}]
            }"#,
        )
        .unwrap_err();

        assert!(matches!(err, CatalogError::DuplicateName { pool: "basePlayerCards", .. }));
    }

    #[test]
    fn test_wrong_pool_rejected() {
        let err = CardCatalog::from_json_str(
            r#"{
                "basePlayerCards": [{"name": "A", "category": "Attack", "effect": "logic"}],
                "baseEnemyCards": [{"name": "B", "category": "Attack", "effect": "logic"}],
                "defenseCards": [{"name": "C", "category": "Evasion", "effect": "cancel"}]
            }"#,
        )
        .unwrap_err();

        assert!(matches!(err, CatalogError::Template(_)));
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            CardCatalog::from_json_str("{not json"),
            Err(CatalogError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = CardCatalog::from_path("/nonexistent/duelogue/cards.json").unwrap_err();
        assert!(matches!(err, CatalogError::Io(_)));
    }
}
