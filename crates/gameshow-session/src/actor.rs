//! Session actor: an isolated Tokio task that owns one game instance.
//!
//! Each session runs in its own task and talks to the rest of the server
//! through an mpsc channel — no shared mutable state, just message
//! passing. Commands are processed one at a time to completion, which is
//! the whole concurrency story: two near-simultaneous buzzes serialize in
//! the mailbox, so "at most one holder" needs no lock.
//!
//! The countdown lives inside the actor's `select!` loop rather than in a
//! spawned task. Arming and cancelling are plain field writes on a value
//! the actor owns, so a countdown cannot race a newer one or outlive the
//! round that armed it.

use std::collections::HashMap;

use gameshow_protocol::{
    Ack, ClientRequest, ConnectionId, Role, RoomCode, ServerEvent, ServerMessage,
};
use gameshow_ticker::{Countdown, CountdownSignal};
use tokio::sync::{mpsc, oneshot};

use crate::session::{Audience, Outcome, TimerCmd};
use crate::{GameError, Session, SessionConfig};

/// Channel for delivering outbound wire messages to one connection's
/// writer task.
pub type OutboundSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a session actor through its mailbox.
pub(crate) enum SessionCommand {
    /// Add (or refresh) a participant and register their outbound channel.
    Join {
        conn: ConnectionId,
        name: String,
        role: Role,
        sender: OutboundSender,
        reply: oneshot::Sender<Ack>,
    },

    /// Apply an in-session action on behalf of a connection.
    Act {
        conn: ConnectionId,
        request: ClientRequest,
        reply: oneshot::Sender<Ack>,
    },

    /// A participant's connection went away.
    Leave { conn: ConnectionId },

    /// Tear the session down (host left). Broadcasts the farewell before
    /// the actor stops.
    Shutdown,
}

/// Handle to a running session actor. Cheap to clone; the registry keeps
/// one per room.
#[derive(Clone)]
pub struct SessionHandle {
    code: RoomCode,
    sender: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Adds a participant. The ack is ready to send back over the wire.
    pub async fn join(
        &self,
        conn: ConnectionId,
        name: String,
        role: Role,
        sender: OutboundSender,
    ) -> Ack {
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = SessionCommand::Join { conn, name, role, sender, reply: reply_tx };
        if self.sender.send(cmd).await.is_err() {
            return Ack::fail(gameshow_protocol::FailureReason::RoomNotFound);
        }
        reply_rx
            .await
            .unwrap_or_else(|_| Ack::fail(gameshow_protocol::FailureReason::RoomNotFound))
    }

    /// Routes an action and waits for its acknowledgment.
    pub async fn act(&self, conn: ConnectionId, request: ClientRequest) -> Ack {
        let (reply_tx, reply_rx) = oneshot::channel();
        let cmd = SessionCommand::Act { conn, request, reply: reply_tx };
        if self.sender.send(cmd).await.is_err() {
            return Ack::fail(gameshow_protocol::FailureReason::RoomNotFound);
        }
        reply_rx
            .await
            .unwrap_or_else(|_| Ack::fail(gameshow_protocol::FailureReason::RoomNotFound))
    }

    /// Reports a participant's disconnect (fire-and-forget).
    pub async fn leave(&self, conn: ConnectionId) {
        let _ = self.sender.send(SessionCommand::Leave { conn }).await;
    }

    /// Tells the session to shut down.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(SessionCommand::Shutdown).await;
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct SessionActor {
    session: Session,
    /// Per-connection outbound channels, host included.
    senders: HashMap<ConnectionId, OutboundSender>,
    countdown: Countdown,
    receiver: mpsc::Receiver<SessionCommand>,
}

impl SessionActor {
    async fn run(mut self) {
        tracing::info!(room = %self.session.code(), "session actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    None => break,
                    Some(SessionCommand::Shutdown) => {
                        self.countdown.cancel();
                        self.dispatch(Audience::Room, ServerEvent::HostLeft);
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                },
                signal = self.countdown.next_signal() => self.handle_signal(signal),
            }
        }

        tracing::info!(room = %self.session.code(), "session actor stopped");
    }

    fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Join { conn, name, role, sender, reply } => {
                self.senders.insert(conn, sender);
                let result = self.session.join(conn, name, role);
                let ack = self.finish(conn, result);
                let _ = reply.send(ack);
            }
            SessionCommand::Act { conn, request, reply } => {
                let result = self.session.handle(conn, request, tokio::time::Instant::now());
                let ack = self.finish(conn, result);
                let _ = reply.send(ack);
            }
            SessionCommand::Leave { conn } => {
                self.senders.remove(&conn);
                let out = self.session.remove_player(conn);
                self.apply(out);
            }
            // Intercepted in run() before reaching here.
            SessionCommand::Shutdown => {}
        }
    }

    /// Turns an action result into the caller's ack, applying the outcome
    /// on success. Failures mutate nothing and reach nobody else.
    fn finish(&mut self, conn: ConnectionId, result: Result<Outcome, GameError>) -> Ack {
        match result {
            Ok(out) => {
                let data = out.data.clone();
                self.apply(out);
                match data {
                    Some(data) => Ack::ok_with(data),
                    None => Ack::ok(),
                }
            }
            Err(err) => {
                tracing::debug!(room = %self.session.code(), %conn, error = %err, "request refused");
                Ack::fail(err.reason())
            }
        }
    }

    fn apply(&mut self, out: Outcome) {
        match out.timer {
            TimerCmd::Keep => {}
            TimerCmd::Cancel => self.countdown.cancel(),
            TimerCmd::Arm(window) => self.countdown.arm_in(window),
        }
        for (audience, event) in out.events {
            self.dispatch(audience, event);
        }
    }

    fn handle_signal(&mut self, signal: CountdownSignal) {
        match signal {
            CountdownSignal::Tick { remaining_secs } => {
                self.dispatch(Audience::Room, ServerEvent::CountdownTick {
                    seconds: remaining_secs,
                });
            }
            CountdownSignal::Expired => {
                tracing::debug!(room = %self.session.code(), "answer window expired");
                self.dispatch(Audience::Room, ServerEvent::TimeUp);
            }
        }
    }

    /// Delivers one event to its audience. Connections whose receiver is
    /// gone are silently skipped.
    fn dispatch(&self, audience: Audience, event: ServerEvent) {
        let msg = ServerMessage::Event(event);
        match audience {
            Audience::Room => {
                for sender in self.senders.values() {
                    let _ = sender.send(msg.clone());
                }
            }
            Audience::Players => {
                for (conn, sender) in &self.senders {
                    let is_player =
                        self.session.player(*conn).is_some_and(|p| p.role == Role::Player);
                    if is_player {
                        let _ = sender.send(msg.clone());
                    }
                }
            }
            Audience::Host => {
                if let Some(sender) = self.senders.get(&self.session.host()) {
                    let _ = sender.send(msg);
                }
            }
            Audience::One(conn) => {
                if let Some(sender) = self.senders.get(&conn) {
                    let _ = sender.send(msg);
                }
            }
        }
    }
}

/// Spawns a session actor and returns a handle to it.
///
/// The host's outbound channel is registered up front so the host receives
/// broadcasts from the moment the room exists, before it formally joins
/// the roster.
pub(crate) fn spawn_session(
    code: RoomCode,
    host: ConnectionId,
    host_sender: OutboundSender,
    config: SessionConfig,
    channel_size: usize,
) -> SessionHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let countdown = Countdown::with_period(config.countdown_period);
    let actor = SessionActor {
        session: Session::new(code.clone(), host, config),
        senders: HashMap::from([(host, host_sender)]),
        countdown,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    SessionHandle { code, sender: tx }
}
