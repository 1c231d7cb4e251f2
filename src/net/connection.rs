//! Client connection to the relay.
//!
//! `Connection` is a state machine over an abstract [`Transport`]. It does
//! no I/O or timing of its own: the embedder reports transport events
//! (`on_open`, `on_close`, `receive`) and calls `tick(now)` regularly.
//! Heartbeats, connect timeouts and reconnection backoff all run off the
//! `now` values it is given.
//!
//! ```text
//! Disconnected --connect--> Connecting --on_open--> Open
//!                               |  ^                  |
//!                        timeout|  |retry due         |on_close / heartbeat timeout
//!                               v  |                  v
//!                            Reconnecting <-----------+
//!                               |
//!                  attempts used up
//!                               v
//!                             Failed
//! ```
//!
//! `disconnect()` moves to `Closed` from any state and never reconnects.

use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use super::message::{decode_server, encode, ClientMessage, Inbound, ServerMessage};
use crate::core::{ConnectionConfig, TransportError};

/// The socket underneath a [`Connection`].
pub trait Transport {
    /// Begin opening. Success is reported later through
    /// [`Connection::on_open`].
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Send one text frame on an open socket.
    fn send(&mut self, text: &str) -> Result<(), TransportError>;

    fn close(&mut self);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Open,
    /// Waiting to retry; `attempt` counts from 1.
    Reconnecting { attempt: u32 },
    /// Reconnection attempts exhausted.
    Failed,
    /// Shut down on purpose.
    Closed,
}

/// Something the embedder may want to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionEvent {
    Opened { reconnected: bool },
    Lost,
    HeartbeatTimeout,
    Reconnecting { attempt: u32, delay: Duration },
    Failed(TransportError),
}

/// Relay connection with an outbound queue, heartbeat and reconnection.
pub struct Connection<T: Transport> {
    transport: T,
    config: ConnectionConfig,
    state: ConnectionState,
    queue: VecDeque<ClientMessage>,

    room_id: Option<String>,
    player_id: Option<String>,
    nickname: Option<String>,

    attempt: u32,
    retry_at: Option<Instant>,
    connect_deadline: Option<Instant>,
    next_ping: Option<Instant>,
    pong_deadline: Option<Instant>,
}

impl<T: Transport> Connection<T> {
    pub fn new(transport: T, config: ConnectionConfig) -> Self {
        Self {
            transport,
            config,
            state: ConnectionState::Disconnected,
            queue: VecDeque::new(),
            room_id: None,
            player_id: None,
            nickname: None,
            attempt: 0,
            retry_at: None,
            connect_deadline: None,
            next_ping: None,
            pong_deadline: None,
        }
    }

    /// Identity sent with room requests.
    #[must_use]
    pub fn with_identity(mut self, player_id: impl Into<String>, nickname: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self.nickname = Some(nickname.into());
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Room joined or created, re-joined after a reconnect.
    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    /// Messages waiting for the connection to open.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Open the connection.
    ///
    /// Does nothing if already connecting or open. A failed attempt
    /// starts reconnection.
    pub fn connect(&mut self, now: Instant) -> Result<Vec<ConnectionEvent>, TransportError> {
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {
                warn!("connect called while {:?}", self.state);
                Ok(Vec::new())
            }
            ConnectionState::Closed => Err(TransportError::Closed),
            _ => Ok(self.attempt_connect(now)),
        }
    }

    /// The transport finished opening.
    pub fn on_open(&mut self, now: Instant) -> Vec<ConnectionEvent> {
        if self.state == ConnectionState::Closed {
            self.transport.close();
            return Vec::new();
        }

        let reconnected = self.attempt > 0;
        self.state = ConnectionState::Open;
        self.attempt = 0;
        self.retry_at = None;
        self.connect_deadline = None;
        self.next_ping = Some(now + self.config.heartbeat_interval);
        self.pong_deadline = None;
        info!("connected to relay{}", if reconnected { " again" } else { "" });

        if reconnected {
            if let Some(room_id) = self.room_id.clone() {
                info!("rejoining room {room_id}");
                // A join queued before the first open is superseded by the rejoin.
                self.queue.retain(|m| !matches!(m, ClientMessage::JoinRoom { .. }));
                let rejoin = ClientMessage::JoinRoom {
                    room_id,
                    player_id: self.player_id.clone(),
                    nickname: self.nickname.clone(),
                };
                self.queue.push_front(rejoin);
            }
        }
        self.flush();
        vec![ConnectionEvent::Opened { reconnected }]
    }

    /// The transport closed without `disconnect()` being called.
    pub fn on_close(&mut self, now: Instant) -> Vec<ConnectionEvent> {
        match self.state {
            ConnectionState::Closed | ConnectionState::Failed => Vec::new(),
            ConnectionState::Reconnecting { .. } => Vec::new(),
            _ => {
                warn!("connection to relay lost");
                let mut events = vec![ConnectionEvent::Lost];
                events.extend(self.schedule_reconnect(now));
                events
            }
        }
    }

    /// Shut down for good: drop the queue and the room, close the
    /// transport, never reconnect.
    pub fn disconnect(&mut self) {
        info!("disconnecting from relay");
        self.queue.clear();
        self.transport.close();
        self.state = ConnectionState::Closed;
        self.room_id = None;
        self.attempt = 0;
        self.retry_at = None;
        self.connect_deadline = None;
        self.next_ping = None;
        self.pong_deadline = None;
    }

    /// Advance timers to `now`.
    pub fn tick(&mut self, now: Instant) -> Vec<ConnectionEvent> {
        let mut events = Vec::new();
        match self.state {
            ConnectionState::Connecting => {
                if self.connect_deadline.is_some_and(|deadline| now >= deadline) {
                    warn!("{}", TransportError::ConnectTimeout);
                    self.transport.close();
                    events.extend(self.schedule_reconnect(now));
                }
            }
            ConnectionState::Reconnecting { attempt } => {
                if self.retry_at.is_some_and(|at| now >= at) {
                    info!("reconnecting, attempt {attempt}/{}", self.config.max_retries);
                    events.extend(self.attempt_connect(now));
                }
            }
            ConnectionState::Open => {
                if self.pong_deadline.is_some_and(|deadline| now >= deadline) {
                    warn!("no PONG within {:?}", self.config.heartbeat_timeout);
                    self.transport.close();
                    events.push(ConnectionEvent::HeartbeatTimeout);
                    events.extend(self.schedule_reconnect(now));
                } else if self.next_ping.is_some_and(|at| now >= at) {
                    self.ping(now);
                }
            }
            _ => {}
        }
        events
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// Send a message, queueing it if the connection is not open or the
    /// send fails.
    pub fn send(&mut self, message: ClientMessage) -> Result<(), TransportError> {
        match self.state {
            ConnectionState::Closed | ConnectionState::Failed => return Err(TransportError::Closed),
            ConnectionState::Open => {}
            _ => {
                warn!("not connected, queueing {}", message.kind());
                self.queue.push_back(message);
                return Ok(());
            }
        }

        if !self.queue.is_empty() {
            self.queue.push_back(message);
            self.flush();
            return Ok(());
        }
        if let Err(e) = self.transmit(&message) {
            warn!("{e}, queueing {}", message.kind());
            self.queue.push_back(message);
        }
        Ok(())
    }

    /// Create a room as host.
    pub fn create_room(&mut self) -> Result<(), TransportError> {
        self.send(ClientMessage::CreateRoom {
            player_id: self.player_id.clone(),
            nickname: self.nickname.clone(),
        })
    }

    /// Join an existing room as guest.
    pub fn join_room(&mut self, room_id: impl Into<String>) -> Result<(), TransportError> {
        let room_id = room_id.into();
        self.room_id = Some(room_id.clone());
        self.send(ClientMessage::JoinRoom {
            room_id,
            player_id: self.player_id.clone(),
            nickname: self.nickname.clone(),
        })
    }

    /// Handle one text frame from the relay.
    ///
    /// Returns the message for the session layer. Heartbeat replies,
    /// unknown types and malformed messages are consumed here.
    pub fn receive(&mut self, text: &str) -> Option<ServerMessage> {
        let message = match decode_server(text) {
            Ok(Inbound::Message(message)) => message,
            Ok(Inbound::Unknown(kind)) => {
                warn!("ignoring unknown message type {kind}");
                return None;
            }
            Err(e) => {
                warn!("dropping message: {e}");
                return None;
            }
        };

        match &message {
            ServerMessage::Pong => {
                self.pong_deadline = None;
                return None;
            }
            ServerMessage::RoomCreated { room_id } | ServerMessage::RoomJoined { room_id } => {
                self.room_id = Some(room_id.clone());
            }
            _ => {}
        }
        debug!("received {}", message.kind());
        Some(message)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn attempt_connect(&mut self, now: Instant) -> Vec<ConnectionEvent> {
        match self.transport.connect() {
            Ok(()) => {
                self.state = ConnectionState::Connecting;
                self.connect_deadline = Some(now + self.config.connect_timeout);
                Vec::new()
            }
            Err(e) => {
                warn!("{e}");
                self.schedule_reconnect(now)
            }
        }
    }

    fn schedule_reconnect(&mut self, now: Instant) -> Vec<ConnectionEvent> {
        self.connect_deadline = None;
        self.next_ping = None;
        self.pong_deadline = None;

        if self.attempt >= self.config.max_retries {
            let failure = TransportError::MaxReconnectAttempts(self.config.max_retries);
            error!("{failure}");
            self.state = ConnectionState::Failed;
            self.retry_at = None;
            return vec![ConnectionEvent::Failed(failure)];
        }

        self.attempt += 1;
        let delay = self.config.backoff(self.attempt);
        self.retry_at = Some(now + delay);
        self.state = ConnectionState::Reconnecting { attempt: self.attempt };
        info!("retrying in {delay:?} ({}/{})", self.attempt, self.config.max_retries);
        vec![ConnectionEvent::Reconnecting {
            attempt: self.attempt,
            delay,
        }]
    }

    fn ping(&mut self, now: Instant) {
        if let Err(e) = self.transmit(&ClientMessage::Ping) {
            debug!("heartbeat not sent: {e}");
        }
        self.pong_deadline = Some(now + self.config.heartbeat_timeout);
        self.next_ping = Some(now + self.config.heartbeat_interval);
    }

    /// Send queued messages in order, stopping at the first failure.
    fn flush(&mut self) {
        if !self.queue.is_empty() {
            debug!("flushing {} queued messages", self.queue.len());
        }
        while let Some(message) = self.queue.pop_front() {
            if let Err(e) = self.transmit(&message) {
                warn!("flush stopped: {e}");
                self.queue.push_front(message);
                break;
            }
        }
    }

    fn transmit(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        let text = encode(message).map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.transport.send(&text)
    }
}
