//! Question bank collaborator for Gameshow.
//!
//! A side, read-only dependency of the game engine: the host's client asks
//! for questions here and then feeds them into the round one at a time.
//! Nothing in this crate mutates game state.

mod bank;
mod error;

pub use bank::{QuestionBank, StaticBank};
pub use error::BankError;
