//! Error types.
//!
//! One enum per failure domain, plus a crate-level [`Error`] that wraps
//! them. Selection exhaustion (empty pools, empty deck) is not an error
//! anywhere in the crate.

use thiserror::Error;

use super::side::Side;

/// A single card template failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid card template `{name}`: {reason}")]
pub struct TemplateError {
    pub name: String,
    pub reason: String,
}

impl TemplateError {
    pub(crate) fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// The card catalog could not be loaded. Fatal to starting a match.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read card catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed card catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("duplicate card `{name}` in pool `{pool}`")]
    DuplicateName { name: String, pool: &'static str },

    #[error("catalog defines no attack cards for the {0} side")]
    EmptyAttackPool(Side),
}

/// A match operation was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("the match has not started")]
    NotStarted,

    #[error("the match is waiting for the host's state")]
    AwaitingSync,

    #[error("the match is over")]
    GameOver,

    #[error("it is not the {0} side's turn")]
    NotYourTurn(Side),

    #[error("the {0} side has already played this turn")]
    AlreadyPlayed(Side),

    #[error("no card at hand index {index}")]
    NoSuchCard { index: usize },

    #[error("card `{name}` has already been used")]
    CardUsed { name: String },
}

/// An incoming wire message was rejected.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message has no string `type` field")]
    MissingType,

    #[error("malformed `{kind}` message: {reason}")]
    InvalidShape { kind: String, reason: String },
}

/// The connection to the relay failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("connection attempt failed: {0}")]
    ConnectFailed(String),

    #[error("connection attempt timed out")]
    ConnectTimeout,

    #[error("the connection has been shut down")]
    Closed,

    #[error("gave up after {0} reconnection attempts")]
    MaxReconnectAttempts(u32),
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to encode state: {0}")]
    Encode(String),
}

impl Error {
    /// Whether this error ends the session and needs its own failure screen,
    /// as opposed to a recoverable condition or a rejected action.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Catalog(_)
                | Error::Transport(TransportError::MaxReconnectAttempts(_))
                | Error::Transport(TransportError::Closed)
        )
    }
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;
