//! Match rules outside card resolution.
//!
//! - `Scoring`: Point awards and the victory check
//! - `OpponentPolicy`: How the computer opponent picks its card

pub mod policy;
pub mod scoring;

pub use policy::{OpponentPolicy, RandomOpponent};
pub use scoring::{ScoreEvent, ScoreReason, Scoring};
