//! Card choice for the computer opponent.

use crate::core::{Character, GameRng};

/// Picks which card the computer opponent plays.
pub trait OpponentPolicy {
    /// Choose a hand index of an unused card in `me.hand`.
    ///
    /// Returns `None` if there is nothing to play.
    fn choose_card(&self, me: &Character, opponent: &Character, rng: &mut GameRng) -> Option<usize>;
}

/// Uniform random choice among the unused cards in hand.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomOpponent;

impl OpponentPolicy for RandomOpponent {
    fn choose_card(&self, me: &Character, _opponent: &Character, rng: &mut GameRng) -> Option<usize> {
        let playable: Vec<usize> = me
            .hand
            .iter()
            .enumerate()
            .filter(|(_, card)| !card.used)
            .map(|(index, _)| index)
            .collect();
        rng.choose(&playable).copied()
    }
}

impl<P: OpponentPolicy + ?Sized> OpponentPolicy for &P {
    fn choose_card(&self, me: &Character, opponent: &Character, rng: &mut GameRng) -> Option<usize> {
        (**self).choose_card(me, opponent, rng)
    }
}
