//! Shared fixtures for the in-crate test modules.

use gameshow_protocol::{ConnectionId, QuestionSpec, Role, RoomCode};
use tokio::time::Instant;

use crate::session::Outcome;
use crate::{GameError, Session, SessionConfig};

pub(crate) const HOST: ConnectionId = ConnectionId(1);
pub(crate) const ANN: ConnectionId = ConnectionId(2);
pub(crate) const BOB: ConnectionId = ConnectionId(3);

/// A session with a host (Quinn) and two players, Ann before Bob.
pub(crate) fn session_with_players() -> Session {
    let mut session = Session::new(RoomCode::new("AB12"), HOST, SessionConfig::default());
    session.join(HOST, "Quinn".into(), Role::Host).unwrap();
    session.join(ANN, "Ann".into(), Role::Player).unwrap();
    session.join(BOB, "Bob".into(), Role::Player).unwrap();
    session
}

pub(crate) fn choice_question() -> QuestionSpec {
    QuestionSpec::MultipleChoice {
        text: "Largest planet?".into(),
        choices: vec!["Mars".into(), "Jupiter".into()],
        correct: 1,
    }
}

pub(crate) fn buzzer_question(text: &str) -> QuestionSpec {
    QuestionSpec::Buzzer { text: text.into(), answer: "Neil Armstrong".into() }
}

pub(crate) fn sequence_question() -> QuestionSpec {
    QuestionSpec::Sequence {
        text: "Name the year".into(),
        answer: "1969".into(),
        steps: vec!["step one".into(), "step two".into(), "step three".into()],
        step_points: vec![30, 20, 10],
    }
}

/// Shorthand for dealing a question at the current instant.
pub(crate) trait OpenQuestion {
    fn open_question(
        &mut self,
        conn: ConnectionId,
        question: QuestionSpec,
    ) -> Result<Outcome, GameError>;
}

impl OpenQuestion for Session {
    fn open_question(
        &mut self,
        conn: ConnectionId,
        question: QuestionSpec,
    ) -> Result<Outcome, GameError> {
        self.start_question(conn, question, Instant::now())
    }
}
