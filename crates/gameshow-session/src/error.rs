//! Error types for the session layer.

use gameshow_protocol::{FailureReason, RoomCode};

/// A refused game action.
///
/// Every variant is non-fatal: the caller gets it back as a structured
/// acknowledgment and no state has been touched. The room never sees these.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// No session is registered under the given code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// A host-only action was attempted by a non-host connection.
    #[error("only the host may do that")]
    NotHost,

    /// The action needs an active round (or an active question) and there
    /// is none.
    #[error("no active round")]
    NoActiveRound,

    /// Someone else already holds the buzzer.
    #[error("someone already buzzed in")]
    AlreadyBuzzed,

    /// The caller is individually locked out of buzzing.
    #[error("locked out of buzzing")]
    LockedOut,

    /// The round's buzzers are closed.
    #[error("buzzers are locked")]
    BuzzersLocked,

    /// The answer window has already closed.
    #[error("too late, the answer window has closed")]
    TooLate,

    /// Reveal requested before all players answered, before the deadline,
    /// on a question type that waits for both.
    #[error("too early to reveal the answer")]
    EarlyReveal,

    /// Every sequence step is already visible.
    #[error("no more steps to reveal")]
    NoMoreSteps,

    /// The question's type does not fit the current round.
    #[error("question type does not match the round")]
    InvalidQuestionType,

    /// The question bank could not serve the request.
    #[error("question bank unavailable")]
    QuestionBankUnavailable,
}

impl GameError {
    /// The wire-level failure name for this error.
    pub fn reason(&self) -> FailureReason {
        match self {
            Self::RoomNotFound(_) => FailureReason::RoomNotFound,
            Self::NotHost => FailureReason::NotHost,
            Self::NoActiveRound => FailureReason::NoActiveRound,
            Self::AlreadyBuzzed => FailureReason::AlreadyBuzzed,
            Self::LockedOut => FailureReason::LockedOut,
            Self::BuzzersLocked => FailureReason::BuzzersLocked,
            Self::TooLate => FailureReason::TooLate,
            Self::EarlyReveal => FailureReason::EarlyReveal,
            Self::NoMoreSteps => FailureReason::NoMoreSteps,
            Self::InvalidQuestionType => FailureReason::InvalidQuestionType,
            Self::QuestionBankUnavailable => FailureReason::QuestionBankUnavailable,
        }
    }
}
