//! Wire protocol for Gameshow.
//!
//! Defines the language that host and player clients speak with the
//! server:
//!
//! - **Types** ([`ClientRequest`], [`Ack`], [`ServerEvent`],
//!   [`ServerMessage`], identity newtypes) — the structures on the wire.
//! - **Codec** ([`Codec`], [`JsonCodec`]) — how they become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! This crate knows nothing about connections, sessions, or game rules —
//! it is the shared leaf everything else builds on.

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    Ack, AckData, AnswerValue, BuzzSeat, ClientRequest, ConnectionId, FailureReason,
    QuestionKind, QuestionSpec, Role, RoomCode, RosterEntry, ScoreEntry, ServerEvent,
    ServerMessage, normalize_answer,
};
