//! Structured log entries produced by resolution.
//!
//! Each entry renders to the short marker the UI appends after the card's
//! text, e.g. `Fact (Pierces defense!) -6 logic`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::Stat;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEntry {
    /// A cancel reversed the named card.
    Cancelled { card: String },
    /// Attack after a defense: ×1.5.
    PiercesDefense,
    /// Defense after an evasion: ×1.5.
    TrapsDodge,
    ShieldAbsorbed { amount: i32 },
    ShieldBroken,
    ShieldRaised { amount: i32 },
    Damage { stat: Stat, amount: i32 },
    Healed { stat: Stat, amount: i32 },
    Mirrored { stat: Stat, amount: i32 },
    Reflected { stat: Stat, amount: i32 },
    /// A replayed card ran into a held repeat card and was nullified.
    RepeatNullified,
    /// A replayed card earned the target a repeat card.
    RepeatGranted,
    /// A held repeat card was spent, losing the turn.
    RepeatSpent,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogEntry::Cancelled { card } => write!(f, "(Cancels \"{card}\")"),
            LogEntry::PiercesDefense => f.write_str("(Pierces defense!)"),
            LogEntry::TrapsDodge => f.write_str("(Traps the dodge!)"),
            LogEntry::ShieldAbsorbed { amount } => write!(f, "(Shield: -{amount})"),
            LogEntry::ShieldBroken => f.write_str("(Shield broken!)"),
            LogEntry::ShieldRaised { amount } => write!(f, "(Shield: +{amount})"),
            LogEntry::Damage { stat, amount } => write!(f, "-{amount} {stat}"),
            LogEntry::Healed { stat, amount } => write!(f, "+{amount} {stat}"),
            LogEntry::Mirrored { stat, amount } => write!(f, "-{amount} {stat} to the opponent"),
            LogEntry::Reflected { stat, amount } => write!(f, "-{amount} {stat} reflected!"),
            LogEntry::RepeatNullified => f.write_str("(Nullified: \"You already said that!\")"),
            LogEntry::RepeatGranted => f.write_str("(The opponent must hear it again)"),
            LogEntry::RepeatSpent => f.write_str("(Repeats itself and loses the turn)"),
        }
    }
}
