//! # duelogue
//!
//! Rules engine for Duelogue, a two-sided argument card battler, with
//! host/guest multiplayer reconciliation.
//!
//! Each side has two stats, logic and emotion. Logic sets the hand limit
//! and emotion scales outgoing damage. Cards attack a stat, heal or shield,
//! or evade the opponent's last card. Driving an opponent's stat to zero
//! scores a point; three points win.
//!
//! ## Design Principles
//!
//! 1. **Explicit context**: A `Match` owns both characters, the catalog
//!    and the RNG. There is no global state.
//!
//! 2. **Deterministic**: Every random choice goes through `GameRng`, so a
//!    seed reproduces a single-player match. In multiplayer, random
//!    outcomes are baked into the card that goes over the wire.
//!
//! 3. **Sans-IO**: Networking is a set of state machines fed with frames
//!    and timestamps. Sockets, timers and rendering stay with the embedder.
//!
//! ## Modules
//!
//! - `core`: Sides, stats, characters, configuration, errors, RNG
//! - `cards`: Card templates, instances and the catalog
//! - `deck`: Decks, hands, draws and card grants
//! - `effects`: Card resolution
//! - `rules`: Scoring, victory and the computer opponent
//! - `game`: The match aggregate and its reports
//! - `net`: Wire messages, connection, relay and multiplayer session

pub mod core;
pub mod cards;
pub mod deck;
pub mod effects;
pub mod rules;
pub mod game;
pub mod net;

pub use crate::core::{
    AppliedEffects, Character, ConnectionConfig, Error, GameRng, MatchConfig, MatchError, Result, Side, SideMap,
    StartingStats, Stat,
};

pub use crate::cards::{CardCatalog, CardInstance, CardKind, CardTemplate, Category};

pub use crate::deck::DeckManager;

pub use crate::effects::{EffectResolver, LogEntry, Resolution, ResolverContext};

pub use crate::rules::{OpponentPolicy, RandomOpponent, ScoreEvent, Scoring};

pub use crate::game::{Match, MatchPhase, MatchSnapshot, TurnReport};

pub use crate::net::{ClientMessage, Connection, MultiplayerSession, RoomRegistry, ServerMessage, Transport};
