//! Host/guest reconciliation over a local match mirror.
//!
//! Each peer keeps a full [`Match`] in which its own character is
//! `Side::Player`. The host deals, moves first and is the source of truth
//! for resyncs. A local play is resolved on the mirror and announced as a
//! `PLAYER_MOVE` carrying the card before resolution (random outcomes
//! already baked in) and the mover's hand; the other peer replays it
//! through the same resolver. Only the owner of a character ever adds
//! cards to its hand.

use im::Vector;
use log::{info, warn};

use super::message::{ClientMessage, Role, ServerMessage};
use crate::cards::{CardCatalog, CardInstance};
use crate::core::{MatchConfig, MatchError, Side};
use crate::game::{Match, MatchPhase, TurnReport};

/// What happened, for the embedder to show.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    RoomReady { room_id: String },
    OpponentJoined { opponent_id: String, nickname: Option<String> },
    /// Play began; `first` is the side to act, from this peer's view.
    Started { first: Side },
    /// The host's state was adopted.
    Synced,
    OpponentMoved(Box<TurnReport>),
    /// The opponent's card was missing locally and a resync was asked for
    /// or pushed.
    Desync,
    GameOver { winner: Side },
    OpponentDisconnected,
    RelayError(String),
}

/// Events and the messages to send in response.
#[derive(Clone, Debug, Default)]
pub struct SessionOutput {
    pub events: Vec<SessionEvent>,
    pub outgoing: Vec<ClientMessage>,
}

impl SessionOutput {
    fn event(mut self, event: SessionEvent) -> Self {
        self.events.push(event);
        self
    }
}

/// One peer's view of a multiplayer match.
#[derive(Debug)]
pub struct MultiplayerSession {
    role: Role,
    room_id: Option<String>,
    game: Match,
}

impl MultiplayerSession {
    /// A host session; deals both characters immediately.
    pub fn host(catalog: CardCatalog, config: MatchConfig, seed: u64) -> Self {
        Self {
            role: Role::Host,
            room_id: None,
            game: Match::host(catalog, config, seed),
        }
    }

    /// A guest session; waits for the host's state.
    pub fn guest(catalog: CardCatalog, config: MatchConfig, seed: u64) -> Self {
        Self {
            role: Role::Guest,
            room_id: None,
            game: Match::guest(catalog, config, seed),
        }
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    #[must_use]
    pub fn game(&self) -> &Match {
        &self.game
    }

    /// Whether it is this peer's turn and it has not played yet.
    #[must_use]
    pub fn can_play(&self) -> bool {
        !self.game.is_over() && self.game.active() == Side::Player && !self.game.has_played()
    }

    /// Play the card at `hand_index` from this peer's hand.
    ///
    /// Returns the local report and the messages announcing the move and,
    /// if it ended the match, the result. The turn passes immediately.
    pub fn play(&mut self, hand_index: usize) -> Result<(TurnReport, Vec<ClientMessage>), MatchError> {
        let report = self.game.play_card(Side::Player, hand_index)?;
        let room_id = self.room_id.clone().unwrap_or_default();
        let mut outgoing = Vec::new();

        if let Some(played) = report.played.clone() {
            outgoing.push(ClientMessage::PlayerMove {
                room_id: room_id.clone(),
                card: played.card,
                hand: Some(played.hand),
            });
        }

        match report.winner {
            Some(winner) => {
                info!("match over, {winner} won");
                outgoing.push(ClientMessage::GameOver {
                    room_id,
                    winner: self.role_of(winner),
                });
            }
            None => {
                self.game.end_turn()?;
            }
        }
        Ok((report, outgoing))
    }

    /// React to a message from the relay.
    pub fn handle(&mut self, message: ServerMessage) -> Result<SessionOutput, MatchError> {
        let out = SessionOutput::default();
        match message {
            ServerMessage::RoomCreated { room_id } | ServerMessage::RoomJoined { room_id } => {
                self.room_id = Some(room_id.clone());
                Ok(out.event(SessionEvent::RoomReady { room_id }))
            }
            ServerMessage::OpponentJoined {
                opponent_id,
                opponent_nickname,
            } => Ok(out.event(SessionEvent::OpponentJoined {
                opponent_id,
                nickname: opponent_nickname,
            })),
            ServerMessage::GameStart { .. } => match self.role {
                Role::Host if self.game.phase() == MatchPhase::NotStarted => {
                    self.game.start(Side::Player)?;
                    let mut out = out.event(SessionEvent::Started { first: Side::Player });
                    out.outgoing.push(self.sync_message());
                    Ok(out)
                }
                Role::Host => {
                    // A guest took the seat again mid-match; hand it the table as it stands.
                    info!("guest seated again, pushing state");
                    let mut out = out;
                    out.outgoing.push(self.sync_message());
                    Ok(out)
                }
                Role::Guest => Ok(out),
            },
            ServerMessage::SyncState { state } => {
                if self.role == Role::Host {
                    warn!("host ignoring SYNC_STATE");
                    return Ok(out);
                }
                let opening = self.game.phase() == MatchPhase::AwaitingSync;
                self.game.restore(state, Side::Enemy);
                let mut out = out.event(SessionEvent::Synced);
                if opening {
                    out.events.push(SessionEvent::Started {
                        first: self.game.active(),
                    });
                }
                Ok(out)
            }
            ServerMessage::OpponentMove { card, hand } => self.opponent_move(card, hand),
            ServerMessage::RequestSync => {
                let mut out = out;
                if self.role == Role::Host {
                    out.outgoing.push(self.sync_message());
                }
                Ok(out)
            }
            ServerMessage::GameOver { winner } => {
                let winner = if winner == self.role { Side::Player } else { Side::Enemy };
                Ok(out.event(SessionEvent::GameOver { winner }))
            }
            ServerMessage::OpponentDisconnected => {
                warn!("opponent disconnected");
                Ok(out.event(SessionEvent::OpponentDisconnected))
            }
            ServerMessage::Error { error } => {
                warn!("relay error: {error}");
                Ok(out.event(SessionEvent::RelayError(error)))
            }
            ServerMessage::Pong => Ok(out),
        }
    }

    fn opponent_move(
        &mut self,
        card: CardInstance,
        hand: Option<Vector<CardInstance>>,
    ) -> Result<SessionOutput, MatchError> {
        let report = self.game.apply_remote_move(card, hand)?;
        let desync = report.desync;
        let winner = report.winner;

        let mut out = SessionOutput::default();
        out.events.push(SessionEvent::OpponentMoved(Box::new(report)));
        if winner.is_none() {
            self.game.end_turn()?;
        }

        if desync {
            out.events.push(SessionEvent::Desync);
            let room_id = self.room_id.clone().unwrap_or_default();
            match self.role {
                Role::Guest => out.outgoing.push(ClientMessage::RequestSync { room_id }),
                Role::Host => out.outgoing.push(self.sync_message()),
            }
        }
        if let Some(winner) = winner {
            out.events.push(SessionEvent::GameOver { winner });
        }
        Ok(out)
    }

    fn sync_message(&self) -> ClientMessage {
        ClientMessage::SyncState {
            room_id: self.room_id.clone().unwrap_or_default(),
            state: self.game.snapshot(),
        }
    }

    fn role_of(&self, side: Side) -> Role {
        match side {
            Side::Player => self.role,
            Side::Enemy => self.role.opponent(),
        }
    }
}
