//! Card resolution - applying a played card to the two characters.
//!
//! `EffectResolver::apply_card` is the whole turn resolution engine. It
//! mutates the source and target characters in place and returns a
//! [`Resolution`] describing what happened. Missing counterpart state
//! (no last card, nothing recorded to cancel) disables the branches that
//! need it; resolution never fails.
//!
//! ## Counter interactions
//!
//! The target's last card changes how this card lands:
//!
//! | Played  | Target's last card | Effect                     |
//! |---------|--------------------|----------------------------|
//! | Attack  | Defense            | damage ×1.5                |
//! | Defense | Evasion            | heal ×1.5                  |
//! | Mirror  | Attack             | returns `modifier` × damage |
//! | Reflect | Attack             | returns full damage        |
//! | Cancel  | anything           | reverses recorded effects  |
//!
//! ## Randomness
//!
//! Random attacks, and mirrors of random attacks, pick a stat by coin
//! flip. The outcome is stored in `CardInstance::resolved_stat`, and an
//! already stored outcome is reused, so replaying the card on another
//! peer lands on the same stat.

use log::debug;
use smallvec::SmallVec;
use std::fmt;

use crate::cards::{AttackTarget, CardCatalog, CardInstance, CardKind, Category, DefenseKind, EvasionKind};
use crate::core::stats::scale;
use crate::core::{AppliedEffects, Character, GameRng, Stat};
use crate::deck::DeckManager;

use super::log_entry::LogEntry;

/// Bonus for attacking into a defense or defending against an evasion.
pub const COUNTER_BONUS: f64 = 1.5;

/// What resolution may touch besides the two characters.
pub struct ResolverContext<'a> {
    /// Source of repeat cards. Without it a replayed card never grants
    /// one, which is how a peer leaves the remote side's hand alone.
    pub catalog: Option<&'a CardCatalog>,
    pub rng: &'a mut GameRng,
}

impl<'a> ResolverContext<'a> {
    /// Context that may grant repeat cards.
    pub fn new(catalog: &'a CardCatalog, rng: &'a mut GameRng) -> Self {
        Self {
            catalog: Some(catalog),
            rng,
        }
    }

    /// Context that leaves the target's hand untouched.
    pub fn without_catalog(rng: &'a mut GameRng) -> Self {
        Self { catalog: None, rng }
    }
}

/// Outcome of one card resolution.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    /// The card text spoken by the character.
    pub speech: String,
    /// Numeric details, in order.
    pub log: SmallVec<[LogEntry; 4]>,
    /// A cancel reversed the opponent's last card.
    pub cancelled: bool,
}

impl Resolution {
    fn new(speech: String) -> Self {
        Self {
            speech,
            ..Self::default()
        }
    }

    /// Log details joined into one line, empty if there are none.
    #[must_use]
    pub fn details(&self) -> String {
        self.log
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `speech` followed by the details, as shown in the match log.
impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.speech)?;
        for entry in &self.log {
            write!(f, " {entry}")?;
        }
        Ok(())
    }
}

/// Applies cards to characters.
pub struct EffectResolver;

impl EffectResolver {
    /// Resolve `card`, played by `source` against `target`.
    ///
    /// Advances the card's text variant, applies its effect, records what
    /// changed on `target.last_card_effects` (replacing the previous
    /// record) for a later cancel, refreshes both watermarks and stores a
    /// copy of the card as `source.last_card`.
    pub fn apply_card(
        card: &mut CardInstance,
        source: &mut Character,
        target: &mut Character,
        ctx: &mut ResolverContext<'_>,
    ) -> Resolution {
        let mut result = Resolution::new(card.text().to_string());
        card.advance_variant();

        let target_last = target.last_card.clone();
        let target_last_category = target_last.as_ref().map(CardInstance::category);
        let mut applied = AppliedEffects::default();

        match *card.kind() {
            CardKind::Evasion(EvasionKind::Cancel) => {
                Self::cancel(source, target, target_last.as_ref(), &mut result);
            }
            CardKind::Evasion(EvasionKind::Mirror { modifier }) => {
                if let Some(last) = target_last.as_ref().filter(|c| c.category() == Category::Attack) {
                    let stat = Self::returned_stat(card, last, ctx.rng);
                    let amount = floor_product(last.damage(), &[modifier, source.damage_multiplier()]);
                    target.modify_stat(stat, -amount);
                    result.log.push(LogEntry::Mirrored { stat, amount });
                }
            }
            CardKind::Evasion(EvasionKind::Reflect) => {
                if let Some(last) = target_last.as_ref().filter(|c| c.category() == Category::Attack) {
                    let stat = Self::returned_stat(card, last, ctx.rng);
                    let amount = floor_product(last.damage(), &[source.damage_multiplier()]);
                    target.modify_stat(stat, -amount);
                    result.log.push(LogEntry::Reflected { stat, amount });
                }
            }
            CardKind::Attack {
                target: attack_target,
                damage,
            } => {
                let mut amount = scale(damage, source.damage_multiplier());
                if target_last_category == Some(Category::Defense) {
                    amount = scale(amount, COUNTER_BONUS);
                    result.log.push(LogEntry::PiercesDefense);
                }
                if amount > 0 {
                    let stat = match attack_target {
                        AttackTarget::Stat(stat) => stat,
                        AttackTarget::Random => Self::baked_flip(card, ctx.rng),
                    };
                    amount = Self::absorb(target, amount, &mut result);
                    if amount > 0 {
                        target.modify_stat(stat, -amount);
                        result.log.push(LogEntry::Damage { stat, amount });
                        applied.record_damage(stat, amount);
                    }
                }
            }
            CardKind::Defense(defense) => {
                let trapped = target_last_category == Some(Category::Evasion);
                if trapped {
                    result.log.push(LogEntry::TrapsDodge);
                }
                match defense {
                    DefenseKind::Shield { amount } => {
                        source.adjust_shield(amount);
                        result.log.push(LogEntry::ShieldRaised { amount });
                        applied.shield_added = Some(amount);
                    }
                    DefenseKind::Heal { stat, amount } => {
                        let amount = if trapped { scale(amount, COUNTER_BONUS) } else { amount };
                        if amount > 0 {
                            source.modify_stat(stat, amount);
                            result.log.push(LogEntry::Healed { stat, amount });
                            applied.record_heal(stat, amount);
                        }
                    }
                }
            }
            CardKind::Repeat => {}
        }

        if card.from_discard {
            Self::punish_replay(target, ctx, &mut result);
        }

        source.update_watermarks();
        target.update_watermarks();
        target.last_card_effects = (!applied.is_empty()).then_some(applied);
        source.last_card = Some(card.clone());

        debug!("resolved `{}`: {}", card.name(), result.details());
        result
    }

    /// Reverse what the target's last card recorded on the source.
    fn cancel(
        source: &mut Character,
        target: &mut Character,
        target_last: Option<&CardInstance>,
        result: &mut Resolution,
    ) {
        let Some(last) = target_last else {
            return;
        };
        let Some(effects) = source.last_card_effects.take() else {
            return;
        };

        if let Some(damage) = effects.logic_damage {
            source.modify_stat(Stat::Logic, damage);
        }
        if let Some(damage) = effects.emotion_damage {
            source.modify_stat(Stat::Emotion, damage);
        }
        if let Some(heal) = effects.logic_heal {
            target.modify_stat(Stat::Logic, -heal);
        }
        if let Some(heal) = effects.emotion_heal {
            target.modify_stat(Stat::Emotion, -heal);
        }
        if let Some(shield) = effects.shield_added {
            target.adjust_shield(-shield);
        }

        result.cancelled = true;
        result.log.push(LogEntry::Cancelled {
            card: last.name().to_string(),
        });
    }

    /// Let the target's shield soak up damage. Returns what gets through.
    fn absorb(target: &mut Character, amount: i32, result: &mut Resolution) -> i32 {
        let shield = target.shield_amount();
        if shield <= 0 {
            return amount;
        }
        let absorbed = shield.min(amount);
        target.adjust_shield(-absorbed);
        result.log.push(LogEntry::ShieldAbsorbed { amount: absorbed });
        if target.shield.is_none() {
            result.log.push(LogEntry::ShieldBroken);
        }
        amount - absorbed
    }

    /// The stat a mirror or reflect sends back: the one the returned
    /// attack aimed at, or a coin flip if that attack was random.
    fn returned_stat(card: &mut CardInstance, last: &CardInstance, rng: &mut GameRng) -> Stat {
        match last.kind() {
            CardKind::Attack {
                target: AttackTarget::Stat(stat),
                ..
            } => *stat,
            _ => Self::baked_flip(card, rng),
        }
    }

    /// Reuse the card's stored coin flip, or flip and store it.
    fn baked_flip(card: &mut CardInstance, rng: &mut GameRng) -> Stat {
        *card.resolved_stat.get_or_insert_with(|| rng.pick_stat())
    }

    /// A replayed card burns the target's held repeat card, or hands the
    /// target a new one.
    fn punish_replay(target: &mut Character, ctx: &mut ResolverContext<'_>, result: &mut Resolution) {
        if let Some(index) = target.hand.iter().position(|c| c.is_repeat() && !c.used) {
            let mut repeat = target.hand.remove(index);
            repeat.used = true;
            target.discard(repeat);
            result.log.push(LogEntry::RepeatNullified);
        } else if let Some(repeat) = ctx.catalog.and_then(CardCatalog::repeat_card) {
            if DeckManager::add_to_hand(repeat, target) {
                result.log.push(LogEntry::RepeatGranted);
            }
        }
    }
}

/// `floor(value × f1 × f2 …)`, multiplying left to right before flooring once.
fn floor_product(value: i32, factors: &[f64]) -> i32 {
    let product = factors.iter().fold(f64::from(value), |acc, f| acc * f);
    product.floor() as i32
}
