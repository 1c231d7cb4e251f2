//! Deck and hand operations.
//!
//! The `DeckManager` borrows the catalog and performs every card fetch a
//! match needs: building decks, dealing the opening hand, drawing back to
//! the hand limit, and the single-card grants (counter, weighted, rare,
//! defense, unique).
//!
//! ## Selection policy
//!
//! Fetches prefer card names the character does not already hold. When
//! the preferred pool is exhausted they fall back as documented per
//! method, and an empty pool simply yields no card. Nothing here returns
//! an error.

use im::Vector;
use log::{debug, warn};

use crate::cards::{CardCatalog, CardInstance, CardTemplate, Category, Pool};
use crate::core::{Character, GameRng, Side, Stat};

/// Deck and hand operations over a catalog.
#[derive(Clone, Copy, Debug)]
pub struct DeckManager<'a> {
    catalog: &'a CardCatalog,
    counter_chance: f64,
}

impl<'a> DeckManager<'a> {
    /// Create a manager with the given counter-card probability.
    #[must_use]
    pub fn new(catalog: &'a CardCatalog, counter_chance: f64) -> Self {
        Self {
            catalog,
            counter_chance,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &'a CardCatalog {
        self.catalog
    }

    // =========================================================================
    // Deck building and dealing
    // =========================================================================

    /// One clone of every template the side can draw: its base attacks,
    /// then all defense, evasion and rare attack cards.
    #[must_use]
    pub fn build_deck(&self, side: Side) -> Vector<CardInstance> {
        [
            Pool::attacks_for(side),
            Pool::Defense,
            Pool::Evasion,
            Pool::RareAttacks,
        ]
        .into_iter()
        .flat_map(|pool| self.catalog.pool(pool))
        .map(|template| self.catalog.instantiate(template))
        .collect()
    }

    /// The opening hand: two attacks, one healing defense and one evasion.
    ///
    /// Attacks and the defense card lean towards the character's stronger
    /// stat. Each pick avoids names already dealt unless its pool has
    /// nothing else to offer. Empty pools contribute no card.
    pub fn deal_initial_hand(
        &self,
        character: &Character,
        side: Side,
        rng: &mut GameRng,
    ) -> Vector<CardInstance> {
        let mut hand = Vector::new();
        let mut dealt: Vec<&str> = Vec::with_capacity(4);
        let attacks = self.catalog.attack_pool(side);
        let logic_weight = character.logic_weight();

        for _ in 0..2 {
            let stat = weighted_stat(logic_weight, rng);
            let pool = prefer_stat(attacks.iter().collect(), stat);
            if let Some(template) = pick_fresh(&pool, &dealt, rng) {
                dealt.push(&template.name);
                hand.push_back(self.catalog.instantiate(template));
            }
        }

        let heals: Vec<&CardTemplate> = self
            .catalog
            .defense_cards()
            .iter()
            .filter(|t| t.kind.stat().is_some())
            .collect();
        if !heals.is_empty() {
            let stat = weighted_stat(logic_weight, rng);
            let pool = prefer_stat(heals, stat);
            if let Some(template) = pick_fresh(&pool, &dealt, rng) {
                dealt.push(&template.name);
                hand.push_back(self.catalog.instantiate(template));
            }
        }

        let evasions: Vec<&CardTemplate> = self.catalog.evasion_cards().iter().collect();
        if let Some(template) = pick_fresh(&evasions, &dealt, rng) {
            hand.push_back(self.catalog.instantiate(template));
        }

        debug!("{side} dealt {} opening cards", hand.len());
        hand
    }

    /// Draw random cards from the deck until the hand reaches its limit or
    /// the deck runs out. Returns the number of cards drawn.
    ///
    /// Each draw retries up to `deck.len()` random indices looking for a
    /// name not in hand, then takes whatever comes up.
    pub fn draw_to_hand_limit(&self, character: &mut Character, rng: &mut GameRng) -> usize {
        let wanted = character.hand_limit().saturating_sub(character.hand.len());
        let mut drawn = 0;

        while drawn < wanted && !character.deck.is_empty() {
            let attempts = character.deck.len();
            let fresh = (0..attempts).find_map(|_| {
                let index = rng.gen_range_usize(0..character.deck.len());
                (!character.has_card(character.deck[index].name())).then_some(index)
            });

            let index = match fresh {
                Some(index) => index,
                None => {
                    let index = rng.gen_range_usize(0..character.deck.len());
                    warn!(
                        "only duplicates left in deck, drawing a second `{}`",
                        character.deck[index].name()
                    );
                    index
                }
            };

            let card = character.deck.remove(index);
            debug!("drew `{}`", card.name());
            character.hand.push_back(card);
            drawn += 1;
        }
        drawn
    }

    // =========================================================================
    // Single-card fetches
    // =========================================================================

    /// A random template from `pool` whose name is not in hand.
    pub fn unique_card(
        &self,
        pool: &[CardTemplate],
        character: &Character,
        rng: &mut GameRng,
    ) -> Option<CardInstance> {
        let refs: Vec<&CardTemplate> = pool.iter().collect();
        self.unique_from(&refs, character, rng)
    }

    fn unique_from(
        &self,
        pool: &[&CardTemplate],
        character: &Character,
        rng: &mut GameRng,
    ) -> Option<CardInstance> {
        let fresh: Vec<&CardTemplate> = pool
            .iter()
            .copied()
            .filter(|t| !character.has_card(&t.name))
            .collect();
        rng.choose(&fresh).map(|t| self.catalog.instantiate(t))
    }

    /// A card from the stat-weighted slice of `pool`: unique if possible,
    /// otherwise any card of that slice.
    pub fn weighted_card(
        &self,
        character: &Character,
        pool: &[CardTemplate],
        rng: &mut GameRng,
    ) -> Option<CardInstance> {
        if pool.is_empty() {
            return None;
        }
        let stat = weighted_stat(character.logic_weight(), rng);
        let slice = prefer_stat(pool.iter().collect(), stat);
        self.unique_from(&slice, character, rng)
            .or_else(|| rng.choose(&slice).map(|t| self.catalog.instantiate(t)))
    }

    /// A stat-weighted rare attack.
    pub fn rare_attack_card(&self, character: &Character, rng: &mut GameRng) -> Option<CardInstance> {
        self.weighted_card(character, self.catalog.rare_attack_cards(), rng)
    }

    /// A defense card not already in hand.
    pub fn defense_card(&self, character: &Character, rng: &mut GameRng) -> Option<CardInstance> {
        self.unique_card(self.catalog.defense_cards(), character, rng)
    }

    /// The card `character` receives in answer to the opponent's `last_card`.
    ///
    /// With probability `counter_chance`: an evasion after an attack, a
    /// weighted attack after a defense, a defense after an evasion.
    pub fn counter_card(
        &self,
        last_card: &CardInstance,
        character: &Character,
        side: Side,
        rng: &mut GameRng,
    ) -> Option<CardInstance> {
        match last_card.category() {
            Category::Attack => {
                if !self.catalog.evasion_cards().is_empty() && rng.chance(self.counter_chance) {
                    return self.unique_card(self.catalog.evasion_cards(), character, rng);
                }
            }
            Category::Defense => {
                if rng.chance(self.counter_chance) {
                    return self.weighted_card(character, self.catalog.attack_pool(side), rng);
                }
            }
            Category::Evasion => {
                if !self.catalog.defense_cards().is_empty() && rng.chance(self.counter_chance) {
                    return self.defense_card(character, rng);
                }
            }
            Category::Special => {}
        }
        None
    }

    // =========================================================================
    // Hand maintenance
    // =========================================================================

    /// Put a granted card into the hand. Returns `false` if a card with the
    /// same name is already held.
    ///
    /// A full hand makes room by discarding its oldest card.
    pub fn add_to_hand(card: CardInstance, character: &mut Character) -> bool {
        if character.has_card(card.name()) {
            return false;
        }
        if character.hand.len() >= character.hand_limit() {
            if let Some(oldest) = character.hand.pop_front() {
                debug!("hand full, discarding `{}`", oldest.name());
                character.discard(oldest);
            }
        }
        character.hand.push_back(card);
        true
    }

    /// Top up a hand that lacks a whole category, while below the limit.
    ///
    /// Adds a weighted attack, a unique defense and a unique evasion as
    /// needed. Which categories are missing is decided before any card is
    /// added.
    pub fn ensure_minimum_composition(&self, character: &mut Character, side: Side, rng: &mut GameRng) {
        let room = character.hand.len() < character.hand_limit();
        let missing: Vec<Category> = [Category::Attack, Category::Defense, Category::Evasion]
            .into_iter()
            .filter(|&category| room && !character.hand.iter().any(|c| c.category() == category))
            .collect();

        for category in missing {
            let card = match category {
                Category::Attack => self.weighted_card(character, self.catalog.attack_pool(side), rng),
                Category::Defense => self.defense_card(character, rng),
                _ => self.unique_card(self.catalog.evasion_cards(), character, rng),
            };
            if let Some(card) = card {
                debug!("{side} missing {category}, granted `{}`", card.name());
                Self::add_to_hand(card, character);
            }
        }
    }

    /// Grant a defense card when a stat first drops below zero.
    ///
    /// Edge-triggered per stat: the flag resets once the stat is back at 0
    /// or above.
    pub fn grant_defense_when_low(&self, character: &mut Character, rng: &mut GameRng) {
        let logic_dropped = character.logic < 0 && !character.logic_negative;
        let emotion_dropped = character.emotion < 0 && !character.emotion_negative;

        if logic_dropped || emotion_dropped {
            if let Some(card) = self.defense_card(character, rng) {
                debug!("stat below zero, granted `{}`", card.name());
                Self::add_to_hand(card, character);
            }
            if character.logic < 0 {
                character.logic_negative = true;
            }
            if character.emotion < 0 {
                character.emotion_negative = true;
            }
        }
        if character.logic >= 0 {
            character.logic_negative = false;
        }
        if character.emotion >= 0 {
            character.emotion_negative = false;
        }
    }
}

/// Roll which stat a weighted fetch favors.
fn weighted_stat(logic_weight: f64, rng: &mut GameRng) -> Stat {
    if rng.chance(logic_weight) {
        Stat::Logic
    } else {
        Stat::Emotion
    }
}

/// Narrow `pool` to cards aligned with `stat`, keeping it whole if none are.
fn prefer_stat(pool: Vec<&CardTemplate>, stat: Stat) -> Vec<&CardTemplate> {
    let aligned: Vec<&CardTemplate> = pool
        .iter()
        .copied()
        .filter(|t| t.kind.stat() == Some(stat))
        .collect();
    if aligned.is_empty() {
        pool
    } else {
        aligned
    }
}

/// Random template not in `taken`, or any template if all are taken.
fn pick_fresh<'t>(pool: &[&'t CardTemplate], taken: &[&str], rng: &mut GameRng) -> Option<&'t CardTemplate> {
    let fresh: Vec<&'t CardTemplate> = pool
        .iter()
        .copied()
        .filter(|t| !taken.contains(&t.name.as_str()))
        .collect();
    if fresh.is_empty() {
        rng.choose(pool).copied()
    } else {
        rng.choose(&fresh).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StartingStats;

    const CATALOG: &str = r#"{
        "basePlayerCards": [
            {"name": "Fact", "category": "Attack", "effect": "logic", "damage": 3},
            {"name": "Proof", "category": "Attack", "effect": "logic", "damage": 4},
            {"name": "Plea", "category": "Attack", "effect": "emotion", "damage": 3}
        ],
        "baseEnemyCards": [
            {"name": "Doubt", "category": "Attack", "effect": "random", "damage": 2}
        ],
        "defenseCards": [
            {"name": "Recall", "category": "Defense", "effect": "logic", "heal": 2},
            {"name": "Breathe", "category": "Defense", "effect": "emotion", "heal": 2},
            {"name": "Wall", "category": "Defense", "effect": "shield", "shield": 4}
        ],
        "evasionCards": [
            {"name": "Dodge", "category": "Evasion", "effect": "cancel"},
            {"name": "Mirror", "category": "Evasion", "effect": "mirror"}
        ],
        "rareAttackCards": [
            {"name": "Epiphany", "category": "Attack", "effect": "emotion", "damage": 6}
        ]
    }"#;

    fn catalog() -> CardCatalog {
        CardCatalog::from_json_str(CATALOG).unwrap()
    }

    fn character() -> Character {
        Character::new(StartingStats::default())
    }

    fn names(cards: &Vector<CardInstance>) -> Vec<&str> {
        cards.iter().map(CardInstance::name).collect()
    }

    // =========================================================================
    // Building and dealing
    // =========================================================================

    #[test]
    fn test_build_deck_contains_one_of_each() {
        let catalog = catalog();
        let deck = DeckManager::new(&catalog, 0.7).build_deck(Side::Player);

        assert_eq!(deck.len(), 3 + 3 + 2 + 1);
        assert!(names(&deck).contains(&"Epiphany"));
        assert!(!names(&deck).contains(&"Doubt"));

        let enemy = DeckManager::new(&catalog, 0.7).build_deck(Side::Enemy);
        assert_eq!(enemy.len(), 1 + 3 + 2 + 1);
    }

    #[test]
    fn test_initial_hand_composition() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);

        for seed in 0..32 {
            let mut rng = GameRng::new(seed);
            let hand = manager.deal_initial_hand(&character(), Side::Player, &mut rng);

            let count = |category| hand.iter().filter(|c| c.category() == category).count();
            assert_eq!(hand.len(), 4);
            assert_eq!(count(Category::Attack), 2);
            assert_eq!(count(Category::Defense), 1);
            assert_eq!(count(Category::Evasion), 1);
            assert!(hand.iter().all(|c| c.name() != "Wall"), "opening defense is never a shield");
        }
    }

    #[test]
    fn test_initial_hand_allows_repeat_when_pool_exhausted() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);
        let mut rng = GameRng::new(5);

        // The enemy pool has a single attack, so both attack slots hold it.
        let hand = manager.deal_initial_hand(&character(), Side::Enemy, &mut rng);
        let doubts = hand.iter().filter(|c| c.name() == "Doubt").count();

        assert_eq!(doubts, 2);
    }

    #[test]
    fn test_draw_respects_limit_and_deck_size() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);
        let mut rng = GameRng::new(1);

        let mut c = character();
        c.logic = 5;
        c.hand = manager.build_deck(Side::Player).into_iter().take(4).collect();
        c.deck = manager.build_deck(Side::Player).into_iter().skip(6).collect();
        assert_eq!(c.deck.len(), 3);

        let drawn = manager.draw_to_hand_limit(&mut c, &mut rng);

        assert_eq!(c.hand_limit(), 6);
        assert_eq!(drawn, 2);
        assert_eq!(c.hand.len(), 6);
        assert_eq!(c.deck.len(), 1);
    }

    #[test]
    fn test_draw_accepts_duplicates_when_only_duplicates_remain() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);
        let mut rng = GameRng::new(9);

        let fact = catalog.attack_pool(Side::Player)[0].clone();
        let mut c = character();
        c.hand.push_back(CardInstance::new(fact.clone()));
        c.deck.push_back(CardInstance::new(fact.clone()));
        c.deck.push_back(CardInstance::new(fact));

        let drawn = manager.draw_to_hand_limit(&mut c, &mut rng);

        assert_eq!(drawn, 2);
        assert!(c.deck.is_empty());
        assert_eq!(c.hand.len(), 3);
    }

    #[test]
    fn test_draw_prefers_new_names() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);

        for seed in 0..16 {
            let mut rng = GameRng::new(seed);
            let mut c = character();
            c.deck = manager.build_deck(Side::Player);
            manager.draw_to_hand_limit(&mut c, &mut rng);

            let mut seen = names(&c.hand);
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), c.hand.len());
        }
    }

    // =========================================================================
    // Single-card fetches
    // =========================================================================

    #[test]
    fn test_unique_card_skips_held_names() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);
        let mut rng = GameRng::new(3);

        let mut c = character();
        c.hand.push_back(catalog.instantiate(&catalog.evasion_cards()[0]));

        for _ in 0..10 {
            let card = manager.unique_card(catalog.evasion_cards(), &c, &mut rng).unwrap();
            assert_eq!(card.name(), "Mirror");
        }

        c.hand.push_back(catalog.instantiate(&catalog.evasion_cards()[1]));
        assert!(manager.unique_card(catalog.evasion_cards(), &c, &mut rng).is_none());
        assert!(manager.unique_card(&[], &c, &mut rng).is_none());
    }

    #[test]
    fn test_weighted_card_follows_stats() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);
        let mut rng = GameRng::new(11);

        let mut c = character();
        c.logic = 8;
        c.emotion = 0;

        for _ in 0..20 {
            let card = manager
                .weighted_card(&c, catalog.attack_pool(Side::Player), &mut rng)
                .unwrap();
            assert_eq!(card.kind().stat(), Some(Stat::Logic));
        }
    }

    #[test]
    fn test_weighted_card_falls_back_to_duplicate() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);
        let mut rng = GameRng::new(2);

        let mut c = character();
        c.hand.push_back(catalog.instantiate(&catalog.rare_attack_cards()[0]));

        let card = manager.rare_attack_card(&c, &mut rng).unwrap();
        assert_eq!(card.name(), "Epiphany");
    }

    #[test]
    fn test_counter_card_by_category() {
        let catalog = catalog();
        let always = DeckManager::new(&catalog, 1.0);
        let never = DeckManager::new(&catalog, 0.0);
        let mut rng = GameRng::new(4);
        let c = character();

        let attack = catalog.instantiate(&catalog.attack_pool(Side::Player)[0]);
        let defense = catalog.instantiate(&catalog.defense_cards()[0]);
        let evasion = catalog.instantiate(&catalog.evasion_cards()[0]);

        let answer = always.counter_card(&attack, &c, Side::Enemy, &mut rng).unwrap();
        assert_eq!(answer.category(), Category::Evasion);

        let answer = always.counter_card(&defense, &c, Side::Enemy, &mut rng).unwrap();
        assert_eq!(answer.name(), "Doubt");

        let answer = always.counter_card(&evasion, &c, Side::Enemy, &mut rng).unwrap();
        assert_eq!(answer.category(), Category::Defense);

        assert!(never.counter_card(&attack, &c, Side::Enemy, &mut rng).is_none());
    }

    // =========================================================================
    // Hand maintenance
    // =========================================================================

    #[test]
    fn test_add_to_hand_rejects_duplicate_name() {
        let catalog = catalog();
        let mut c = character();
        let card = catalog.instantiate(&catalog.defense_cards()[0]);

        assert!(DeckManager::add_to_hand(card.clone(), &mut c));
        assert!(!DeckManager::add_to_hand(card, &mut c));
        assert_eq!(c.hand.len(), 1);
    }

    #[test]
    fn test_add_to_full_hand_discards_oldest() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);
        let mut c = character();
        c.logic = 0;
        c.hand = manager.build_deck(Side::Player).into_iter().take(3).collect();
        let oldest = c.hand[0].name().to_string();

        let card = catalog.instantiate(&catalog.evasion_cards()[0]);
        assert!(DeckManager::add_to_hand(card, &mut c));

        assert_eq!(c.hand.len(), 3);
        assert_eq!(c.discard_pile[0].name(), oldest);
        assert_eq!(c.discard_count, 1);
        assert_eq!(c.hand[2].name(), "Dodge");
    }

    #[test]
    fn test_minimum_composition_fills_missing_categories() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);
        let mut rng = GameRng::new(6);
        let mut c = character();
        c.hand.push_back(catalog.instantiate(&catalog.attack_pool(Side::Player)[0]));

        manager.ensure_minimum_composition(&mut c, Side::Player, &mut rng);

        let categories: Vec<_> = c.hand.iter().map(CardInstance::category).collect();
        assert_eq!(c.hand.len(), 3);
        assert!(categories.contains(&Category::Defense));
        assert!(categories.contains(&Category::Evasion));
    }

    #[test]
    fn test_minimum_composition_skips_full_hand() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);
        let mut rng = GameRng::new(6);
        let mut c = character();
        c.logic = 0;
        c.hand = catalog
            .attack_pool(Side::Player)
            .iter()
            .map(|t| catalog.instantiate(t))
            .collect();

        manager.ensure_minimum_composition(&mut c, Side::Player, &mut rng);

        assert_eq!(c.hand.len(), 3);
        assert!(c.hand.iter().all(|card| card.category() == Category::Attack));
    }

    #[test]
    fn test_defense_granted_once_per_drop() {
        let catalog = catalog();
        let manager = DeckManager::new(&catalog, 0.7);
        let mut rng = GameRng::new(8);
        let mut c = character();

        c.logic = -1;
        manager.grant_defense_when_low(&mut c, &mut rng);
        assert_eq!(c.hand.len(), 1);
        assert!(c.logic_negative);

        manager.grant_defense_when_low(&mut c, &mut rng);
        assert_eq!(c.hand.len(), 1);

        c.logic = 2;
        manager.grant_defense_when_low(&mut c, &mut rng);
        assert!(!c.logic_negative);

        c.logic = -3;
        manager.grant_defense_when_low(&mut c, &mut rng);
        assert_eq!(c.hand.len(), 2);
    }
}
