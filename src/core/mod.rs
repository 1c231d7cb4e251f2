//! Core types: sides, stats, characters, RNG, configuration, errors.
//!
//! Everything else in the crate builds on these.

pub mod character;
pub mod config;
pub mod error;
pub mod rng;
pub mod side;
pub mod stats;

pub use character::{AppliedEffects, Character};
pub use config::{ConnectionConfig, MatchConfig, StartingStats};
pub use error::{CatalogError, Error, MatchError, ProtocolError, Result, TemplateError, TransportError};
pub use rng::GameRng;
pub use side::{Side, SideMap};
pub use stats::Stat;
