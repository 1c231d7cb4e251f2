//! Room relay.
//!
//! The relay pairs a host and a guest in a room and forwards their
//! messages. It never looks inside a move; both peers resolve cards
//! themselves. The registry is sans-IO: the embedding server feeds it
//! peer connects, frames and disconnects and delivers the returned
//! [`Outgoing`] messages.

use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use super::message::{
    decode_client, encode, ClientMessage, Inbound, Role, ServerMessage, ROOM_ID_ALPHABET, ROOM_ID_LEN,
};
use crate::core::GameRng;
use crate::game::MatchSnapshot;

/// Server-assigned connection id.
pub type PeerId = u64;

/// A message to deliver to one peer.
#[derive(Clone, Debug, PartialEq)]
pub struct Outgoing {
    pub to: PeerId,
    pub message: ServerMessage,
}

impl Outgoing {
    fn new(to: PeerId, message: ServerMessage) -> Self {
        Self { to, message }
    }

    /// JSON text of the message.
    pub fn text(&self) -> Result<String, crate::core::ProtocolError> {
        encode(&self.message)
    }
}

#[derive(Clone, Debug)]
struct Seat {
    peer: Option<PeerId>,
    player_id: Option<String>,
}

impl Seat {
    fn empty() -> Self {
        Self {
            peer: None,
            player_id: None,
        }
    }
}

/// One host/guest pairing.
#[derive(Clone, Debug)]
struct Room {
    host: Seat,
    guest: Seat,
    state: Option<MatchSnapshot>,
}

impl Room {
    fn seat(&self, role: Role) -> &Seat {
        match role {
            Role::Host => &self.host,
            Role::Guest => &self.guest,
        }
    }

    fn seat_mut(&mut self, role: Role) -> &mut Seat {
        match role {
            Role::Host => &mut self.host,
            Role::Guest => &mut self.guest,
        }
    }

    fn role_of(&self, peer: PeerId) -> Option<Role> {
        if self.host.peer == Some(peer) {
            Some(Role::Host)
        } else if self.guest.peer == Some(peer) {
            Some(Role::Guest)
        } else {
            None
        }
    }
}

/// Rooms and the peers seated in them.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: FxHashMap<String, Room>,
    seats: FxHashMap<PeerId, (String, Role)>,
    live: FxHashSet<PeerId>,
    rng: GameRng,
}

impl RoomRegistry {
    pub fn new(seed: u64) -> Self {
        Self {
            rooms: FxHashMap::default(),
            seats: FxHashMap::default(),
            live: FxHashSet::default(),
            rng: GameRng::new(seed),
        }
    }

    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    #[must_use]
    pub fn has_room(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Last state the host pushed for `room_id`.
    #[must_use]
    pub fn stored_state(&self, room_id: &str) -> Option<&MatchSnapshot> {
        self.rooms.get(room_id).and_then(|room| room.state.as_ref())
    }

    /// Register a new connection.
    pub fn connect(&mut self, peer: PeerId) {
        debug!("peer {peer} connected");
        self.live.insert(peer);
    }

    /// Handle a raw text frame from `peer`.
    ///
    /// Unknown types are ignored; malformed messages are answered with an
    /// `ERROR`.
    pub fn handle_text(&mut self, peer: PeerId, text: &str) -> Vec<Outgoing> {
        match decode_client(text) {
            Ok(Inbound::Message(message)) => self.handle(peer, message),
            Ok(Inbound::Unknown(kind)) => {
                warn!("peer {peer} sent unknown message type {kind}");
                Vec::new()
            }
            Err(e) => {
                warn!("peer {peer}: {e}");
                vec![error(peer, "invalid message")]
            }
        }
    }

    /// Handle a decoded message from `peer`.
    pub fn handle(&mut self, peer: PeerId, message: ClientMessage) -> Vec<Outgoing> {
        debug!("peer {peer} sent {}", message.kind());
        match message {
            ClientMessage::CreateRoom { player_id, .. } => self.create_room(peer, player_id),
            ClientMessage::JoinRoom {
                room_id,
                player_id,
                nickname,
            } => self.join_room(peer, room_id, player_id, nickname),
            ClientMessage::PlayerMove { room_id, card, hand } => {
                let Some(room) = self.rooms.get(&room_id) else {
                    return vec![error(peer, "room not found")];
                };
                let Some(role) = room.role_of(peer) else {
                    return vec![error(peer, "not seated in this room")];
                };
                match room.seat(role.opponent()).peer {
                    Some(to) => {
                        info!("move in room {room_id}");
                        vec![Outgoing::new(to, ServerMessage::OpponentMove { card, hand })]
                    }
                    None => {
                        // The opponent catches up through a resync when it rejoins.
                        warn!("move in room {room_id} dropped, {} is not seated", role.opponent());
                        Vec::new()
                    }
                }
            }
            ClientMessage::SyncState { room_id, state } => {
                let Some(room) = self.rooms.get_mut(&room_id) else {
                    return Vec::new();
                };
                let Some(role) = room.role_of(peer) else {
                    return Vec::new();
                };
                if role == Role::Host {
                    room.state = Some(state.clone());
                }
                room.seat(role.opponent())
                    .peer
                    .map(|to| Outgoing::new(to, ServerMessage::SyncState { state }))
                    .into_iter()
                    .collect()
            }
            ClientMessage::RequestSync { room_id } => {
                let Some(room) = self.rooms.get(&room_id) else {
                    return vec![error(peer, "room not found")];
                };
                match (room.role_of(peer), room.host.peer) {
                    (Some(Role::Guest), Some(host)) => vec![Outgoing::new(host, ServerMessage::RequestSync)],
                    _ => Vec::new(),
                }
            }
            ClientMessage::GameOver { room_id, winner } => {
                info!("game over in room {room_id}, {winner} won");
                self.broadcast(&room_id, &ServerMessage::GameOver { winner })
            }
            ClientMessage::Ping => vec![Outgoing::new(peer, ServerMessage::Pong)],
        }
    }

    /// Drop a connection and tell its opponent.
    ///
    /// A room loses its host for good when the host leaves; a guest seat is
    /// freed for the next join.
    pub fn disconnect(&mut self, peer: PeerId) -> Vec<Outgoing> {
        self.live.remove(&peer);
        let Some((room_id, role)) = self.seats.remove(&peer) else {
            return Vec::new();
        };
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return Vec::new();
        };
        // The seat may already belong to a newer connection of the same player.
        if room.seat(role).peer != Some(peer) {
            return Vec::new();
        }

        room.seat_mut(role).peer = None;
        let out: Vec<Outgoing> = room
            .seat(role.opponent())
            .peer
            .map(|to| Outgoing::new(to, ServerMessage::OpponentDisconnected))
            .into_iter()
            .collect();

        if role == Role::Host {
            if let Some(guest) = room.guest.peer {
                self.seats.remove(&guest);
            }
            self.rooms.remove(&room_id);
            info!("room {room_id} closed, host left");
        } else {
            info!("guest left room {room_id}");
        }
        out
    }

    /// Remove rooms with no live peer. Returns how many were removed.
    pub fn sweep(&mut self) -> usize {
        let live = &self.live;
        let before = self.rooms.len();
        self.rooms.retain(|room_id, room| {
            let alive = [&room.host, &room.guest]
                .iter()
                .any(|seat| seat.peer.is_some_and(|p| live.contains(&p)));
            if !alive {
                info!("sweeping idle room {room_id}");
            }
            alive
        });
        let rooms = &self.rooms;
        self.seats.retain(|_, (room_id, _)| rooms.contains_key(room_id));
        before - self.rooms.len()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn create_room(&mut self, peer: PeerId, player_id: Option<String>) -> Vec<Outgoing> {
        let room_id = self.fresh_room_id();
        let room = Room {
            host: Seat {
                peer: Some(peer),
                player_id,
            },
            guest: Seat::empty(),
            state: None,
        };
        self.rooms.insert(room_id.clone(), room);
        self.seats.insert(peer, (room_id.clone(), Role::Host));
        info!("room {room_id} created");
        vec![Outgoing::new(peer, ServerMessage::RoomCreated { room_id })]
    }

    fn join_room(
        &mut self,
        peer: PeerId,
        room_id: String,
        player_id: Option<String>,
        nickname: Option<String>,
    ) -> Vec<Outgoing> {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return vec![error(peer, "room not found")];
        };

        // A known player coming back after a reconnect takes its seat again.
        let returning = player_id.as_ref().and_then(|id| {
            [Role::Host, Role::Guest]
                .into_iter()
                .find(|&role| room.seat(role).player_id.as_ref() == Some(id))
        });
        if let Some(role) = returning {
            room.seat_mut(role).peer = Some(peer);
            self.seats.insert(peer, (room_id.clone(), role));
            info!("{role} rejoined room {room_id}");
            let mut out = vec![Outgoing::new(peer, ServerMessage::RoomJoined { room_id })];
            // Moves made while the seat was empty never arrived; the host
            // pushes its state to put both mirrors back in step.
            if let (Some(host), Some(_)) = (room.host.peer, room.guest.peer) {
                out.push(Outgoing::new(host, ServerMessage::RequestSync));
            }
            return out;
        }

        if room.guest.peer.is_some() {
            return vec![error(peer, "room is full")];
        }

        room.guest = Seat {
            peer: Some(peer),
            player_id: player_id.clone(),
        };
        self.seats.insert(peer, (room_id.clone(), Role::Guest));
        info!("guest joined room {room_id}");

        let mut out = vec![Outgoing::new(
            peer,
            ServerMessage::RoomJoined {
                room_id: room_id.clone(),
            },
        )];
        if let Some(host) = room.host.peer {
            out.push(Outgoing::new(
                host,
                ServerMessage::OpponentJoined {
                    opponent_id: player_id.unwrap_or_default(),
                    opponent_nickname: nickname,
                },
            ));
        }
        let start = ServerMessage::GameStart {
            host_id: room.host.player_id.clone(),
            guest_id: room.guest.player_id.clone(),
        };
        out.extend(self.broadcast(&room_id, &start));
        out
    }

    fn broadcast(&self, room_id: &str, message: &ServerMessage) -> Vec<Outgoing> {
        self.rooms
            .get(room_id)
            .map(|room| {
                [&room.host, &room.guest]
                    .iter()
                    .filter_map(|seat| seat.peer)
                    .map(|to| Outgoing::new(to, message.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn fresh_room_id(&mut self) -> String {
        loop {
            let id: String = (0..ROOM_ID_LEN)
                .map(|_| {
                    let index = self.rng.gen_range_usize(0..ROOM_ID_ALPHABET.len());
                    char::from(ROOM_ID_ALPHABET[index])
                })
                .collect();
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

fn error(peer: PeerId, text: &str) -> Outgoing {
    Outgoing::new(
        peer,
        ServerMessage::Error {
            error: text.to_string(),
        },
    )
}
