//! The session: one room's roster plus its current round.
//!
//! `Session` is the synchronous heart of the server. Every client action
//! funnels through [`Session::handle`], which validates preconditions,
//! mutates state, and describes the results as an [`Outcome`] — the reply
//! payload for the caller, the events to fan out, and what to do with the
//! countdown. It performs no I/O and spawns nothing, which is what makes
//! the whole state machine unit-testable without a runtime; the actor
//! wrapping it (see `actor.rs`) owns the channels and the clock.
//!
//! On failure nothing is mutated: every operation checks its preconditions
//! before touching state.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;

use tokio::time::Instant;

use gameshow_protocol::{
    AckData, ClientRequest, ConnectionId, Role, RoomCode, RosterEntry, ScoreEntry,
    ServerEvent,
};

use crate::{GameError, Player, Round, SessionConfig};

/// Who an event is addressed to. Resolved against the roster by the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Everyone in the room, host included.
    Room,
    /// Role-Player connections only.
    Players,
    /// The host connection only.
    Host,
    /// One specific connection.
    One(ConnectionId),
}

/// What the countdown should do after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCmd {
    /// Leave the countdown as it is.
    Keep,
    /// Arm it to expire after this window.
    Arm(Duration),
    /// Disarm it.
    Cancel,
}

/// The full effect of one successful action.
#[derive(Debug)]
pub struct Outcome {
    /// Payload for the caller's acknowledgment, if the action has one.
    pub data: Option<AckData>,
    /// Events to deliver, in order.
    pub events: Vec<(Audience, ServerEvent)>,
    pub timer: TimerCmd,
}

impl Default for Outcome {
    fn default() -> Self {
        Self { data: None, events: Vec::new(), timer: TimerCmd::Keep }
    }
}

impl Outcome {
    pub(crate) fn push(&mut self, audience: Audience, event: ServerEvent) {
        self.events.push((audience, event));
    }
}

/// One game instance: a roster of participants and at most one round.
#[derive(Debug)]
pub struct Session {
    code: RoomCode,
    host: ConnectionId,
    pub(crate) config: SessionConfig,
    pub(crate) players: HashMap<ConnectionId, Player>,
    next_join_order: u64,
    pub(crate) round: Option<Round>,
}

impl Session {
    pub fn new(code: RoomCode, host: ConnectionId, config: SessionConfig) -> Self {
        Self {
            code,
            host,
            config,
            players: HashMap::new(),
            next_join_order: 0,
            round: None,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn host(&self) -> ConnectionId {
        self.host
    }

    pub fn player(&self, conn: ConnectionId) -> Option<&Player> {
        self.players.get(&conn)
    }

    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    // -----------------------------------------------------------------
    // Roster management
    // -----------------------------------------------------------------

    /// Adds a participant, or refreshes their entry if the connection is
    /// already in the roster (a re-join keeps the accumulated score).
    ///
    /// Role Host is honored only for the connection that created the room.
    pub fn join(
        &mut self,
        conn: ConnectionId,
        name: String,
        role: Role,
    ) -> Result<Outcome, GameError> {
        if role == Role::Host && conn != self.host {
            return Err(GameError::NotHost);
        }

        match self.players.entry(conn) {
            Entry::Occupied(mut entry) => {
                let player = entry.get_mut();
                player.name = name;
                player.role = role;
            }
            Entry::Vacant(entry) => {
                entry.insert(Player {
                    name,
                    score: 0,
                    role,
                    buzzer_locked: false,
                    join_order: self.next_join_order,
                });
                self.next_join_order += 1;
            }
        }

        tracing::info!(room = %self.code, %conn, players = self.players.len(), "joined");

        let mut out = Outcome::default();
        out.push(Audience::Room, ServerEvent::Roster { players: self.roster() });
        Ok(out)
    }

    /// Drops a participant and rebroadcasts the roster. Unknown
    /// connections are a no-op.
    pub fn remove_player(&mut self, conn: ConnectionId) -> Outcome {
        let mut out = Outcome::default();
        if self.players.remove(&conn).is_some() {
            tracing::info!(room = %self.code, %conn, players = self.players.len(), "left");
            out.push(Audience::Room, ServerEvent::Roster { players: self.roster() });
        }
        out
    }

    // -----------------------------------------------------------------
    // Action dispatch
    // -----------------------------------------------------------------

    /// Applies one in-session action at time `now`.
    ///
    /// Membership and question-bank requests never reach a session — the
    /// hub resolves those against the registry and the bank.
    pub fn handle(
        &mut self,
        conn: ConnectionId,
        request: ClientRequest,
        now: Instant,
    ) -> Result<Outcome, GameError> {
        match request {
            ClientRequest::StartRound { round_type, duration } => {
                self.start_round(conn, round_type, duration)
            }
            ClientRequest::StartQuestion { question } => {
                self.start_question(conn, question, now)
            }
            ClientRequest::Buzz => self.buzz(conn),
            ClientRequest::ResetBuzzer { all, preserve_locks } => {
                self.reset_buzzer(conn, all, preserve_locks)
            }
            ClientRequest::SubmitAnswer { answer } => self.submit_answer(conn, answer, now),
            ClientRequest::RevealAnswer => self.reveal_answer(conn, now),
            ClientRequest::ConfirmPoints { scores } => self.confirm_points(conn, &scores),
            ClientRequest::EndRound => self.end_round(conn),
            ClientRequest::ShowFullLeaderboard => self.show_full_leaderboard(conn),
            ClientRequest::EndShow => self.end_show(conn),
            ClientRequest::RevealNextStep => self.reveal_next_step(conn),
            ClientRequest::RevealSequenceAnswer => self.reveal_sequence_answer(conn),
            ClientRequest::CreateRoom
            | ClientRequest::JoinRoom { .. }
            | ClientRequest::GetQuestions { .. } => {
                tracing::warn!(room = %self.code, %conn, "membership request routed into a session");
                Err(GameError::RoomNotFound(self.code.clone()))
            }
        }
    }

    // -----------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------

    pub(crate) fn require_host(&self, conn: ConnectionId) -> Result<(), GameError> {
        if conn == self.host { Ok(()) } else { Err(GameError::NotHost) }
    }

    /// The public roster in join order: everyone, host included.
    pub fn roster(&self) -> Vec<RosterEntry> {
        let mut entries: Vec<(u64, RosterEntry)> = self
            .players
            .iter()
            .map(|(id, p)| {
                (p.join_order, RosterEntry { id: *id, name: p.name.clone(), score: p.score })
            })
            .collect();
        entries.sort_by_key(|(order, _)| *order);
        entries.into_iter().map(|(_, e)| e).collect()
    }

    /// Role-Player connections in join order.
    pub(crate) fn player_ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<(u64, ConnectionId)> = self
            .players
            .iter()
            .filter(|(_, p)| p.role == Role::Player)
            .map(|(id, p)| (p.join_order, *id))
            .collect();
        ids.sort_by_key(|(order, _)| *order);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    pub(crate) fn player_name(&self, conn: ConnectionId) -> String {
        self.players.get(&conn).map(|p| p.name.clone()).unwrap_or_default()
    }

    /// Per-player totals from a score map: every role-Player connection in
    /// join order, missing entries read as 0.
    pub(crate) fn score_entries(&self, scores: &HashMap<ConnectionId, i64>) -> Vec<ScoreEntry> {
        self.player_ids()
            .into_iter()
            .map(|id| ScoreEntry {
                id,
                name: self.player_name(id),
                points: scores.get(&id).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Round totals so far, or all zeros when no round is active.
    pub(crate) fn round_totals(&self) -> Vec<ScoreEntry> {
        match &self.round {
            Some(round) => self.score_entries(&round.round_scores),
            None => self.score_entries(&HashMap::new()),
        }
    }
}
