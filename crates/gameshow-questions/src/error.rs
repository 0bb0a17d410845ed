//! Error types for the question bank.

use gameshow_protocol::QuestionKind;

/// Errors that can occur while loading or drawing from a question bank.
#[derive(Debug, thiserror::Error)]
pub enum BankError {
    /// The bank holds no questions of the requested kind.
    #[error("no {0} questions available")]
    NoQuestions(QuestionKind),

    /// The bank file could not be parsed.
    #[error("malformed question bank: {0}")]
    Malformed(#[from] serde_json::Error),
}
