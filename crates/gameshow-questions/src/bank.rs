//! The question bank: where the host's question picker draws from.
//!
//! The bank is a read-only collaborator — the game engine never writes to
//! it, and a draw never touches session state. Deployments supply their
//! own [`QuestionBank`] implementation (database, HTTP service, whatever);
//! [`StaticBank`] is the in-memory implementation used by the demo server
//! and the tests.

use gameshow_protocol::{QuestionKind, QuestionSpec};
use rand::seq::SliceRandom;

use crate::BankError;

/// Supplies questions of a requested kind, in randomized order.
pub trait QuestionBank: Send + Sync + 'static {
    /// Returns up to `count` questions of `kind` in a randomized order.
    ///
    /// Fewer than `count` matching questions is not an error — the caller
    /// gets what exists. An empty result is: the host asked for a round
    /// type this bank cannot serve.
    fn draw(&self, kind: QuestionKind, count: usize) -> Result<Vec<QuestionSpec>, BankError>;
}

/// An in-memory bank over a fixed question list.
#[derive(Debug, Clone, Default)]
pub struct StaticBank {
    questions: Vec<QuestionSpec>,
}

impl StaticBank {
    pub fn new(questions: Vec<QuestionSpec>) -> Self {
        Self { questions }
    }

    /// Loads a bank from a JSON array of questions.
    pub fn from_json(json: &str) -> Result<Self, BankError> {
        let questions: Vec<QuestionSpec> = serde_json::from_str(json)?;
        tracing::debug!(count = questions.len(), "question bank loaded");
        Ok(Self { questions })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

impl QuestionBank for StaticBank {
    fn draw(&self, kind: QuestionKind, count: usize) -> Result<Vec<QuestionSpec>, BankError> {
        let mut matching: Vec<QuestionSpec> = self
            .questions
            .iter()
            .filter(|q| q.kind() == kind)
            .cloned()
            .collect();

        if matching.is_empty() {
            return Err(BankError::NoQuestions(kind));
        }

        matching.shuffle(&mut rand::rng());
        matching.truncate(count);
        Ok(matching)
    }
}

// =========================================================================
// Tests
// =========================================================================
