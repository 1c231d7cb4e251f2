//! The match aggregate.
//!
//! - `Match`: Both characters, turn order and the play operations
//! - `TurnReport`: What one half-turn changed, for display
//! - `MatchSnapshot`: Serializable state for multiplayer resync

pub mod duel;
pub mod report;
pub mod snapshot;

pub use duel::{Match, MatchPhase};
pub use report::{victory_line, PlayedMove, StatLine, TurnReport};
pub use snapshot::MatchSnapshot;
