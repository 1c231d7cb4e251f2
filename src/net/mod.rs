//! Multiplayer plumbing.
//!
//! - `message`: Wire messages and their validation
//! - `connection`: Client connection state machine over a `Transport`
//! - `relay`: Room registry run by the relay server
//! - `session`: Host/guest reconciliation of a local `Match`

pub mod connection;
pub mod message;
pub mod relay;
pub mod session;

pub use connection::{Connection, ConnectionEvent, ConnectionState, Transport};
pub use message::{decode_client, decode_server, encode, is_room_id, ClientMessage, Inbound, Role, ServerMessage};
pub use relay::{Outgoing, PeerId, RoomRegistry};
pub use session::{MultiplayerSession, SessionEvent, SessionOutput};
