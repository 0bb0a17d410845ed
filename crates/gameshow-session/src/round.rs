//! Round state: one sequence of questions of a single type.

use std::collections::HashMap;

use gameshow_protocol::{AnswerValue, BuzzSeat, ConnectionId, QuestionKind, QuestionSpec};
// The runtime's clock is the game clock: deadlines live on the same
// timeline the countdown driver sleeps on.
use tokio::time::Instant;

/// Where the round is in its question cycle.
///
/// ```text
/// AwaitingQuestion → QuestionOpen → AnswerRevealed → ScoresConfirmed
///        ↑                                                  │
///        └──────────────── (next question) ─────────────────┘
/// ```
///
/// The round itself starts in `AwaitingQuestion` and is dropped entirely
/// when the host ends it — there is no terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    AwaitingQuestion,
    QuestionOpen,
    AnswerRevealed,
    ScoresConfirmed,
}

/// All mutable state for one round. At most one per session.
#[derive(Debug)]
pub struct Round {
    pub kind: QuestionKind,
    /// Advertised round length in seconds; round metadata only. The
    /// per-question answer window is configured separately.
    pub duration_secs: u64,
    pub phase: RoundPhase,
    /// Number of questions confirmed so far; bumped once per points
    /// confirmation, never otherwise.
    pub question_index: u32,
    /// Scores accumulated in this round only.
    pub round_scores: HashMap<ConnectionId, i64>,
    pub started_at: Instant,
    /// Deadline of the current question, if it has one.
    pub ends_at: Option<Instant>,
    /// Round-wide buzzer lock: nobody may buzz while set.
    pub buzzers_locked: bool,
    /// Current buzzer holder. At most one at any time.
    pub buzzer: Option<BuzzSeat>,
    /// Whoever buzzed most recently; survives the seat being cleared so
    /// the advance-and-lock reset knows whom to lock out.
    pub last_buzzed: Option<ConnectionId>,
    pub question: Option<QuestionSpec>,
    /// Raw submissions for the current question, keyed by submitter.
    /// Only ever holds role-Player connections.
    pub answers: HashMap<ConnectionId, AnswerValue>,
    /// Provisional per-player scores for the current question.
    pub question_scores: HashMap<ConnectionId, i64>,
    /// Latched once every player has answered the current question.
    pub all_answered: bool,
    /// Index of the last revealed sequence step (0 = first step visible).
    pub revealed_step_index: usize,
}

impl Round {
    pub fn new(kind: QuestionKind, duration_secs: u64) -> Self {
        Self {
            kind,
            duration_secs,
            phase: RoundPhase::AwaitingQuestion,
            question_index: 0,
            round_scores: HashMap::new(),
            started_at: Instant::now(),
            ends_at: None,
            buzzers_locked: false,
            buzzer: None,
            last_buzzed: None,
            question: None,
            answers: HashMap::new(),
            question_scores: HashMap::new(),
            all_answered: false,
            revealed_step_index: 0,
        }
    }

    /// Wipes everything tied to the current question. Round scores and the
    /// question counter survive.
    pub(crate) fn clear_question_state(&mut self) {
        self.question = None;
        self.ends_at = None;
        self.answers.clear();
        self.question_scores.clear();
        self.all_answered = false;
        self.revealed_step_index = 0;
    }

    /// Clears the buzzer seat and its memory of who held it last.
    pub(crate) fn clear_buzzer_seat(&mut self) {
        self.buzzer = None;
        self.last_buzzed = None;
    }

    /// Whether the current question's deadline has passed. Untimed
    /// questions never expire.
    pub fn deadline_passed(&self, now: Instant) -> bool {
        self.ends_at.is_some_and(|ends_at| now > ends_at)
    }
}
