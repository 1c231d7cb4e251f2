//! Wire messages between peers and the relay.
//!
//! Every message is a JSON object with a `type` field in
//! SCREAMING_SNAKE_CASE and camelCase payload fields:
//!
//! ```json
//! {"type": "JOIN_ROOM", "roomId": "AB12CD", "playerId": "p-1"}
//! ```
//!
//! Decoding checks the structure of known message types before
//! deserializing, and reports unknown types separately so the caller can
//! ignore them.

use im::Vector;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cards::CardInstance;
use crate::core::ProtocolError;
use crate::game::MatchSnapshot;

/// Room ids are this many characters of `A-Z0-9`.
pub const ROOM_ID_LEN: usize = 6;

/// Characters a room id is drawn from.
pub const ROOM_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Whether `id` has the shape of a room id.
#[must_use]
pub fn is_room_id(id: &str) -> bool {
    id.len() == ROOM_ID_LEN && id.bytes().all(|b| ROOM_ID_ALPHABET.contains(&b))
}

/// Seat in a multiplayer room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Created the room, deals and moves first.
    Host,
    Guest,
}

impl Role {
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Role::Host => Role::Guest,
            Role::Guest => Role::Host,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Guest => write!(f, "guest"),
        }
    }
}

/// Peer to relay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    CreateRoom {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nickname: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        player_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nickname: Option<String>,
    },
    /// A played card, with the mover's hand before the play.
    #[serde(rename_all = "camelCase")]
    PlayerMove {
        room_id: String,
        card: CardInstance,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hand: Option<Vector<CardInstance>>,
    },
    #[serde(rename_all = "camelCase")]
    SyncState { room_id: String, state: MatchSnapshot },
    #[serde(rename_all = "camelCase")]
    RequestSync { room_id: String },
    #[serde(rename_all = "camelCase")]
    GameOver { room_id: String, winner: Role },
    Ping,
}

impl ClientMessage {
    /// Wire name of the message type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            ClientMessage::CreateRoom { .. } => "CREATE_ROOM",
            ClientMessage::JoinRoom { .. } => "JOIN_ROOM",
            ClientMessage::PlayerMove { .. } => "PLAYER_MOVE",
            ClientMessage::SyncState { .. } => "SYNC_STATE",
            ClientMessage::RequestSync { .. } => "REQUEST_SYNC",
            ClientMessage::GameOver { .. } => "GAME_OVER",
            ClientMessage::Ping => "PING",
        }
    }
}

/// Relay to peer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    RoomCreated { room_id: String },
    #[serde(rename_all = "camelCase")]
    RoomJoined { room_id: String },
    #[serde(rename_all = "camelCase")]
    OpponentJoined {
        opponent_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opponent_nickname: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    GameStart {
        #[serde(default)]
        host_id: Option<String>,
        #[serde(default)]
        guest_id: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    OpponentMove {
        card: CardInstance,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        hand: Option<Vector<CardInstance>>,
    },
    SyncState { state: MatchSnapshot },
    RequestSync,
    GameOver { winner: Role },
    OpponentDisconnected,
    Error { error: String },
    Pong,
}

impl ServerMessage {
    /// Wire name of the message type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            ServerMessage::RoomCreated { .. } => "ROOM_CREATED",
            ServerMessage::RoomJoined { .. } => "ROOM_JOINED",
            ServerMessage::OpponentJoined { .. } => "OPPONENT_JOINED",
            ServerMessage::GameStart { .. } => "GAME_START",
            ServerMessage::OpponentMove { .. } => "OPPONENT_MOVE",
            ServerMessage::SyncState { .. } => "SYNC_STATE",
            ServerMessage::RequestSync => "REQUEST_SYNC",
            ServerMessage::GameOver { .. } => "GAME_OVER",
            ServerMessage::OpponentDisconnected => "OPPONENT_DISCONNECTED",
            ServerMessage::Error { .. } => "ERROR",
            ServerMessage::Pong => "PONG",
        }
    }
}

/// A decoded message, or the type name of one this build does not know.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound<M> {
    Message(M),
    Unknown(String),
}

const CLIENT_KINDS: &[&str] = &[
    "CREATE_ROOM",
    "JOIN_ROOM",
    "PLAYER_MOVE",
    "SYNC_STATE",
    "REQUEST_SYNC",
    "GAME_OVER",
    "PING",
];

const SERVER_KINDS: &[&str] = &[
    "ROOM_CREATED",
    "ROOM_JOINED",
    "OPPONENT_JOINED",
    "GAME_START",
    "OPPONENT_MOVE",
    "SYNC_STATE",
    "REQUEST_SYNC",
    "GAME_OVER",
    "OPPONENT_DISCONNECTED",
    "ERROR",
    "PONG",
];

/// Serialize a message to its JSON text.
pub fn encode<M: Serialize>(message: &M) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

/// Decode a message received from the relay.
pub fn decode_server(text: &str) -> Result<Inbound<ServerMessage>, ProtocolError> {
    decode(text, SERVER_KINDS, check_server_shape)
}

/// Decode a message received from a peer.
pub fn decode_client(text: &str) -> Result<Inbound<ClientMessage>, ProtocolError> {
    decode(text, CLIENT_KINDS, check_client_shape)
}

fn decode<M: DeserializeOwned>(
    text: &str,
    known: &[&str],
    check: fn(&str, &Value) -> Result<(), String>,
) -> Result<Inbound<M>, ProtocolError> {
    let value: Value = serde_json::from_str(text)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?
        .to_string();

    if !known.contains(&kind.as_str()) {
        return Ok(Inbound::Unknown(kind));
    }

    let invalid = |reason: String| ProtocolError::InvalidShape {
        kind: kind.clone(),
        reason,
    };
    check(&kind, &value).map_err(invalid)?;
    serde_json::from_value(value)
        .map(Inbound::Message)
        .map_err(|e| invalid(e.to_string()))
}

fn check_server_shape(kind: &str, value: &Value) -> Result<(), String> {
    match kind {
        "ROOM_CREATED" | "ROOM_JOINED" => require_room_id(value, "roomId"),
        "OPPONENT_JOINED" => require_string(value, "opponentId"),
        "OPPONENT_MOVE" => require_card(value),
        "SYNC_STATE" => require_object(value, "state"),
        "ERROR" => require_string(value, "error"),
        _ => Ok(()),
    }
}

fn check_client_shape(kind: &str, value: &Value) -> Result<(), String> {
    match kind {
        "JOIN_ROOM" | "REQUEST_SYNC" | "GAME_OVER" => require_string(value, "roomId"),
        "PLAYER_MOVE" => {
            require_string(value, "roomId")?;
            require_card(value)
        }
        "SYNC_STATE" => {
            require_string(value, "roomId")?;
            require_object(value, "state")
        }
        _ => Ok(()),
    }
}

fn require_string(value: &Value, field: &str) -> Result<(), String> {
    match value.get(field) {
        Some(Value::String(_)) => Ok(()),
        _ => Err(format!("`{field}` must be a string")),
    }
}

fn require_room_id(value: &Value, field: &str) -> Result<(), String> {
    match value.get(field).and_then(Value::as_str) {
        Some(id) if id.chars().count() == ROOM_ID_LEN => Ok(()),
        _ => Err(format!("`{field}` must be a {ROOM_ID_LEN}-character string")),
    }
}

fn require_object(value: &Value, field: &str) -> Result<(), String> {
    match value.get(field) {
        Some(Value::Object(_)) => Ok(()),
        _ => Err(format!("`{field}` must be an object")),
    }
}

fn require_card(value: &Value) -> Result<(), String> {
    let named = value
        .get("card")
        .and_then(Value::as_object)
        .and_then(|card| card.get("name"))
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty());
    if named {
        Ok(())
    } else {
        Err("`card` must be an object with a name".to_string())
    }
}
