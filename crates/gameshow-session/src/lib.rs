//! Session, round, and scoring state machine for Gameshow.
//!
//! One [`Session`] is one room: a roster with a single host and the round
//! currently in play. The synchronous core ([`Session`] and the engine,
//! buzzer, and scoring methods on it) owns every game rule; the
//! [`SessionHandle`]/actor pair wraps it in a mailbox so each session
//! processes one action at a time, and the [`SessionRegistry`] maps room
//! codes to running sessions.
//!
//! # Key types
//!
//! - [`Session`] — roster + round + action dispatch
//! - [`Round`] / [`RoundPhase`] — per-round state
//! - [`SessionRegistry`] — code → session routing, connection lifecycle
//! - [`SessionHandle`] — send commands to a running session actor
//! - [`SessionConfig`] — answer window, provisional points, tick period
//! - [`GameError`] — every way an action can be refused

mod actor;
mod buzzer;
mod config;
mod engine;
mod error;
mod player;
mod registry;
mod round;
mod scoring;
mod session;
#[cfg(test)]
pub(crate) mod test_support;

pub use actor::{OutboundSender, SessionHandle};
pub use config::SessionConfig;
pub use error::GameError;
pub use player::Player;
pub use registry::SessionRegistry;
pub use round::{Round, RoundPhase};
pub use session::{Audience, Outcome, Session, TimerCmd};
