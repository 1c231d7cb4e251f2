//! Full match state for multiplayer resync.
//!
//! A snapshot is the `SYNC_STATE` payload. It is taken from the sender's
//! perspective; the receiver swaps it when its own character is the
//! sender's enemy.

use serde::{Deserialize, Serialize};

use crate::core::{Character, Error, Result, Side, SideMap};

/// Serializable match state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub sides: SideMap<Character>,
    pub active: Side,
    pub has_played: bool,
    pub turn: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<Side>,
}

impl MatchSnapshot {
    /// The same state seen from the other seat.
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            sides: self.sides.swapped(),
            active: self.active.opponent(),
            has_played: self.has_played,
            turn: self.turn,
            winner: self.winner.map(Side::opponent),
        }
    }

    /// Bytes of the scoring-relevant numbers: points, logic, emotion and
    /// shield of the player and then the enemy.
    ///
    /// Two mirrors of one match agree on these bit for bit.
    pub fn fingerprint(&self) -> Result<Vec<u8>> {
        let numbers: Vec<(u32, i32, i32, Option<i32>)> = Side::BOTH
            .iter()
            .map(|&side| {
                let c = &self.sides[side];
                (c.points, c.logic, c.emotion, c.shield)
            })
            .collect();
        bincode::serialize(&numbers).map_err(|e| Error::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StartingStats;

    fn snapshot() -> MatchSnapshot {
        let mut sides = SideMap::with_value(Character::new(StartingStats::default()));
        sides[Side::Player].points = 2;
        sides[Side::Enemy].shield = Some(3);
        MatchSnapshot {
            sides,
            active: Side::Player,
            has_played: false,
            turn: 4,
            winner: None,
        }
    }

    #[test]
    fn test_swapped() {
        let swapped = snapshot().swapped();

        assert_eq!(swapped.sides[Side::Enemy].points, 2);
        assert_eq!(swapped.sides[Side::Player].shield, Some(3));
        assert_eq!(swapped.active, Side::Enemy);
        assert_eq!(swapped.turn, 4);
    }

    #[test]
    fn test_fingerprint_tracks_perspective() {
        let snap = snapshot();

        assert_eq!(
            snap.fingerprint().unwrap(),
            snap.clone().swapped().swapped().fingerprint().unwrap()
        );
        assert_ne!(
            snap.fingerprint().unwrap(),
            snap.clone().swapped().fingerprint().unwrap()
        );
    }

    #[test]
    fn test_json_round_trip() {
        let snap = snapshot();
        let json = serde_json::to_string(&snap).unwrap();
        let back: MatchSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back, snap);
    }
}
