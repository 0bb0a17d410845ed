//! Session registry: creates sessions, owns their handles, routes
//! connections to them.
//!
//! The registry is the only structure touched by more than one session.
//! The hub keeps it behind a single mutex; per-session state lives inside
//! each session's actor and is never shared.

use std::collections::HashMap;

use gameshow_protocol::{Ack, ClientRequest, ConnectionId, FailureReason, Role, RoomCode};
use rand::Rng;

use crate::actor::{OutboundSender, SessionHandle, spawn_session};
use crate::SessionConfig;

/// Default mailbox size for session actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Alphabet for room codes: uppercase letters and digits.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 4;

/// Owns every active session and the connection → room index.
pub struct SessionRegistry {
    sessions: HashMap<RoomCode, SessionHandle>,
    /// Which room each connection is in (hosts included).
    members: HashMap<ConnectionId, RoomCode>,
    /// Which room each host connection created.
    hosts: HashMap<ConnectionId, RoomCode>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            members: HashMap::new(),
            hosts: HashMap::new(),
            config,
        }
    }

    /// Creates a session with the caller as host and returns its code.
    ///
    /// Codes are not checked against in-flight codes; a collision would
    /// replace the older entry.
    pub fn create_session(
        &mut self,
        host: ConnectionId,
        sender: OutboundSender,
    ) -> RoomCode {
        let code = generate_room_code();
        let handle = spawn_session(
            code.clone(),
            host,
            sender,
            self.config.clone(),
            DEFAULT_CHANNEL_SIZE,
        );
        self.sessions.insert(code.clone(), handle);
        self.hosts.insert(host, code.clone());
        self.members.insert(host, code.clone());
        tracing::info!(room = %code, %host, "session created");
        code
    }

    /// Joins a connection to the session registered under `code`.
    pub async fn join_session(
        &mut self,
        code: &RoomCode,
        conn: ConnectionId,
        name: String,
        role: Role,
        sender: OutboundSender,
    ) -> Ack {
        let Some(handle) = self.sessions.get(code) else {
            return Ack::fail(FailureReason::RoomNotFound);
        };

        let ack = handle.join(conn, name, role, sender).await;
        if ack.ok {
            self.members.insert(conn, code.clone());
        }
        ack
    }

    /// Routes an in-session action to the caller's session.
    pub async fn act(&self, conn: ConnectionId, request: ClientRequest) -> Ack {
        let Some(code) = self.members.get(&conn) else {
            return Ack::fail(FailureReason::RoomNotFound);
        };
        let Some(handle) = self.sessions.get(code) else {
            return Ack::fail(FailureReason::RoomNotFound);
        };
        handle.act(conn, request).await
    }

    /// Handles a dropped connection.
    ///
    /// A departing host tears its room down (the actor broadcasts the
    /// farewell); a departing player is removed from its roster.
    pub async fn disconnect(&mut self, conn: ConnectionId) {
        if let Some(code) = self.hosts.remove(&conn) {
            self.members.remove(&conn);
            if let Some(handle) = self.sessions.remove(&code) {
                handle.shutdown().await;
            }
            self.members.retain(|_, c| *c != code);
            tracing::info!(room = %code, "host left, session torn down");
        } else if let Some(code) = self.members.remove(&conn) {
            if let Some(handle) = self.sessions.get(&code) {
                handle.leave(conn).await;
            }
        }
    }

    /// Removes a session outright, regardless of its host.
    pub async fn remove_session(&mut self, code: &RoomCode) {
        if let Some(handle) = self.sessions.remove(code) {
            handle.shutdown().await;
        }
        self.members.retain(|_, c| c != code);
        self.hosts.retain(|_, c| c != code);
        tracing::info!(room = %code, "session removed");
    }

    /// The room a connection currently belongs to, if any.
    pub fn member_room(&self, conn: ConnectionId) -> Option<&RoomCode> {
        self.members.get(&conn)
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

/// Four uppercase alphanumerics, e.g. `"AB12"`.
fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    RoomCode::new(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_room_code_shape() {
        for _ in 0..100 {
            let code = generate_room_code();
            assert_eq!(code.as_str().len(), CODE_LEN);
            assert!(
                code.as_str()
                    .bytes()
                    .all(|b| CODE_ALPHABET.contains(&b)),
                "unexpected character in {code}"
            );
        }
    }
}
