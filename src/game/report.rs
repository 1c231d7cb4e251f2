//! What a half-turn hands to the presentation layer.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::CardInstance;
use crate::core::{Character, Side, SideMap};
use crate::effects::Resolution;
use crate::rules::ScoreEvent;

/// Displayed numbers for one side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatLine {
    pub logic: i32,
    pub emotion: i32,
    pub max_logic: i32,
    pub max_emotion: i32,
    pub points: u32,
    pub shield: Option<i32>,
    pub hand_limit: usize,
    pub damage_multiplier: f64,
}

impl From<&Character> for StatLine {
    fn from(c: &Character) -> Self {
        Self {
            logic: c.logic,
            emotion: c.emotion,
            max_logic: c.max_logic,
            max_emotion: c.max_emotion,
            points: c.points,
            shield: c.shield,
            hand_limit: c.hand_limit(),
            damage_multiplier: c.damage_multiplier(),
        }
    }
}

/// A local play as the remote mirror must replay it.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayedMove {
    /// The card before resolution, with any coin flip already baked in.
    pub card: CardInstance,
    /// The mover's hand before the play.
    pub hand: Vector<CardInstance>,
}

/// Result of one half-turn.
#[derive(Clone, Debug)]
pub struct TurnReport {
    pub actor: Side,
    pub turn: u32,

    /// The card played, as it stands after resolution.
    pub card: Option<CardInstance>,
    pub resolution: Option<Resolution>,

    /// Human-readable lines, in order: the play, points, the outcome.
    pub log: Vec<String>,
    pub score_events: Vec<ScoreEvent>,

    pub stats: SideMap<StatLine>,
    pub hands: SideMap<Vector<CardInstance>>,

    /// Set when this half-turn ended the match.
    pub winner: Option<Side>,

    /// Present for local plays in a match that has a remote side.
    pub played: Option<PlayedMove>,

    /// The remote card was missing from the mirrored hand.
    pub desync: bool,
}

impl TurnReport {
    pub(crate) fn new(actor: Side, turn: u32) -> Self {
        Self {
            actor,
            turn,
            card: None,
            resolution: None,
            log: Vec::new(),
            score_events: Vec::new(),
            stats: SideMap::with_value(StatLine::from(&Character::new(Default::default()))),
            hands: SideMap::default(),
            winner: None,
            played: None,
            desync: false,
        }
    }

    /// Whether the match is over after this half-turn.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.winner.is_some()
    }
}

/// Closing line for a finished match.
#[must_use]
pub fn victory_line(winner: Side, points_to_win: u32) -> String {
    match winner {
        Side::Player => format!("You won! All {points_to_win} of your points are lit!"),
        Side::Enemy => "The Skeptic won! You lost!".to_string(),
    }
}
