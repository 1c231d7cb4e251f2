//! Side identification and per-side data storage.
//!
//! ## Side
//!
//! A Duelogue match always has exactly two sides: the local `Player` and
//! the `Enemy` (the computer opponent, or the remote peer in multiplayer).
//!
//! ## SideMap
//!
//! Fixed two-slot storage indexed by `Side`. Supports iteration and
//! swapping, which multiplayer uses to flip a host's view into a guest's.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// One of the two sides of a match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The local player.
    Player,
    /// The opponent (computer or remote peer).
    Enemy,
}

impl Side {
    /// Both sides, player first.
    pub const BOTH: [Side; 2] = [Side::Player, Side::Enemy];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }

    /// Slot index (player = 0, enemy = 1).
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Enemy => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Player => write!(f, "player"),
            Side::Enemy => write!(f, "enemy"),
        }
    }
}

/// Per-side data storage.
///
/// ## Example
///
/// ```
/// use duelogue::core::{Side, SideMap};
///
/// let mut points: SideMap<u32> = SideMap::with_value(0);
/// points[Side::Enemy] += 1;
///
/// assert_eq!(points[Side::Player], 0);
/// assert_eq!(points.swapped()[Side::Player], 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideMap<T> {
    pub player: T,
    pub enemy: T,
}

impl<T> SideMap<T> {
    /// Create a map from explicit values.
    pub const fn new(player: T, enemy: T) -> Self {
        Self { player, enemy }
    }

    /// Create a map with values from a factory function.
    pub fn from_fn(mut factory: impl FnMut(Side) -> T) -> Self {
        Self {
            player: factory(Side::Player),
            enemy: factory(Side::Enemy),
        }
    }

    /// Create a map with both entries set to the same value.
    pub fn with_value(value: T) -> Self
    where
        T: Clone,
    {
        Self {
            player: value.clone(),
            enemy: value,
        }
    }

    /// Get a reference to a side's data.
    #[must_use]
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    /// Get a mutable reference to a side's data.
    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    /// Borrow both entries mutably as `(side, side.opponent())`.
    pub fn pair_mut(&mut self, side: Side) -> (&mut T, &mut T) {
        match side {
            Side::Player => (&mut self.player, &mut self.enemy),
            Side::Enemy => (&mut self.enemy, &mut self.player),
        }
    }

    /// Exchange the two entries.
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            player: self.enemy,
            enemy: self.player,
        }
    }

    /// Transform both entries.
    pub fn map<U>(self, mut f: impl FnMut(Side, T) -> U) -> SideMap<U> {
        SideMap {
            player: f(Side::Player, self.player),
            enemy: f(Side::Enemy, self.enemy),
        }
    }

    /// Iterate over (Side, &T) pairs, player first.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        [(Side::Player, &self.player), (Side::Enemy, &self.enemy)].into_iter()
    }
}

impl<T> Index<Side> for SideMap<T> {
    type Output = T;

    fn index(&self, side: Side) -> &Self::Output {
        self.get(side)
    }
}

impl<T> IndexMut<Side> for SideMap<T> {
    fn index_mut(&mut self, side: Side) -> &mut Self::Output {
        self.get_mut(side)
    }
}
