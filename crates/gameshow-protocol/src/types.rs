//! Everything that travels on the wire between clients and the server.
//!
//! Three message families:
//!
//! - [`ClientRequest`] — actions a host or player client sends.
//! - [`Ack`] — the per-request acknowledgment, delivered to the caller only.
//! - [`ServerEvent`] — room broadcasts, wrapped in [`ServerMessage`].
//!
//! Every request gets exactly one `Ack`; everything else a client sees is
//! an event. The JSON shapes are pinned by the tests at the bottom of this
//! file — the browser clients parse these exact forms.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Unique identifier for one client connection.
///
/// Assigned by the hub when a socket is accepted and never reused within a
/// process. `#[serde(transparent)]` keeps it a plain number on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A human-typeable room code, e.g. `"AB12"`.
///
/// Always stored uppercase so lookups are case-insensitive from the
/// player's point of view — including codes arriving off the wire, which
/// is why `Deserialize` is hand-written rather than derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl<'de> Deserialize<'de> for RoomCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(RoomCode::new)
    }
}

impl RoomCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Participant role within a session. The first creator of a room is its
/// host; everyone else is a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    #[default]
    Player,
}

// ---------------------------------------------------------------------------
// Answers and normalization
// ---------------------------------------------------------------------------

/// A submitted answer: either a choice position or free-form text.
///
/// `#[serde(untagged)]` lets the wire carry both `{"answer": 1}` and
/// `{"answer": "jupiter"}` without a discriminator, which is what the
/// clients send depending on the question type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Index(usize),
    Text(String),
}

/// Reduces an answer to a canonical comparable string.
///
/// `Text` trims and lowercases. `Index` resolves through the question's
/// choice list first; an out-of-range index yields `None` (callers score
/// that as wrong, never as an error).
pub fn normalize_answer(answer: &AnswerValue, choices: &[String]) -> Option<String> {
    match answer {
        AnswerValue::Index(i) => choices.get(*i).map(|c| c.trim().to_lowercase()),
        AnswerValue::Text(t) => Some(t.trim().to_lowercase()),
    }
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

/// The three question variants a round can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionKind {
    MultipleChoice,
    Buzzer,
    Sequence,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultipleChoice => f.write_str("multipleChoice"),
            Self::Buzzer => f.write_str("buzzer"),
            Self::Sequence => f.write_str("sequence"),
        }
    }
}

/// A full question as the host (and the question bank) sees it, answer
/// included. Player-facing views are derived from this; the spec itself is
/// only ever sent to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum QuestionSpec {
    /// Pick-one question with a fixed answer window.
    MultipleChoice {
        text: String,
        choices: Vec<String>,
        /// Position of the correct choice.
        correct: usize,
    },
    /// Open question answered live by whoever buzzes in first.
    Buzzer { text: String, answer: String },
    /// Progressive reveal: clues are shown one at a time, worth fewer
    /// points the more of them are visible.
    Sequence {
        text: String,
        answer: String,
        steps: Vec<String>,
        #[serde(default)]
        step_points: Vec<i64>,
    },
}

impl QuestionSpec {
    pub fn kind(&self) -> QuestionKind {
        match self {
            Self::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            Self::Buzzer { .. } => QuestionKind::Buzzer,
            Self::Sequence { .. } => QuestionKind::Sequence,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::MultipleChoice { text, .. }
            | Self::Buzzer { text, .. }
            | Self::Sequence { text, .. } => text,
        }
    }

    /// The choice list, empty for variants that have none.
    pub fn choices(&self) -> &[String] {
        match self {
            Self::MultipleChoice { choices, .. } => choices,
            _ => &[],
        }
    }

    /// The correct answer in normalized (comparable) form.
    ///
    /// `None` only when a multiple-choice question's `correct` index points
    /// outside its own choice list.
    pub fn normalized_answer(&self) -> Option<String> {
        match self {
            Self::MultipleChoice { choices, correct, .. } => {
                normalize_answer(&AnswerValue::Index(*correct), choices)
            }
            Self::Buzzer { answer, .. } | Self::Sequence { answer, .. } => {
                Some(answer.trim().to_lowercase())
            }
        }
    }

    /// The correct answer as shown to the room when it is revealed.
    pub fn display_answer(&self) -> String {
        match self {
            Self::MultipleChoice { choices, correct, .. } => {
                choices.get(*correct).cloned().unwrap_or_default()
            }
            Self::Buzzer { answer, .. } | Self::Sequence { answer, .. } => answer.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Roster and score entries
// ---------------------------------------------------------------------------

/// One line of the public roster: who is in the room and their cumulative
/// score. Answer contents never appear here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: ConnectionId,
    pub name: String,
    pub score: i64,
}

/// One line of a per-question or per-round score listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: ConnectionId,
    pub name: String,
    pub points: i64,
}

/// The current buzzer holder: who buzzed and when (Unix millis).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuzzSeat {
    pub id: ConnectionId,
    pub name: String,
    pub ts: u64,
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

/// Why a request was refused. Returned to the caller inside an [`Ack`];
/// never broadcast to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureReason {
    RoomNotFound,
    NotHost,
    NoActiveRound,
    AlreadyBuzzed,
    LockedOut,
    BuzzersLocked,
    TooLate,
    /// Answer reveal requested before anyone could have finished answering.
    #[serde(rename = "early")]
    EarlyReveal,
    NoMoreSteps,
    InvalidQuestionType,
    QuestionBankUnavailable,
}

// ---------------------------------------------------------------------------
// Client → server requests
// ---------------------------------------------------------------------------

/// An action issued by a connected client. Host-only actions are enforced
/// server-side; the enum itself makes no distinction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientRequest {
    CreateRoom,
    JoinRoom {
        room: RoomCode,
        name: String,
        #[serde(default)]
        role: Role,
    },
    StartRound {
        round_type: QuestionKind,
        duration: u64,
    },
    StartQuestion {
        question: QuestionSpec,
    },
    Buzz,
    ResetBuzzer {
        all: bool,
        preserve_locks: bool,
    },
    SubmitAnswer {
        answer: AnswerValue,
    },
    RevealAnswer,
    /// Point deltas keyed by connection id. Values are raw JSON so that a
    /// sloppy host client can send anything; non-numeric deltas count as 0.
    ConfirmPoints {
        scores: HashMap<ConnectionId, serde_json::Value>,
    },
    EndRound,
    ShowFullLeaderboard,
    EndShow,
    GetQuestions {
        round_type: QuestionKind,
        count: usize,
    },
    RevealNextStep,
    RevealSequenceAnswer,
}

// ---------------------------------------------------------------------------
// Acknowledgments
// ---------------------------------------------------------------------------

/// Request-specific payload carried by a successful [`Ack`].
///
/// Untagged: the payload fields sit directly next to `ok` in the JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum AckData {
    Room { room: RoomCode },
    Buzzer { buzzer: BuzzSeat },
    Questions { questions: Vec<QuestionSpec> },
    StepIndex { revealed_step_index: usize },
}

/// The direct reply to a [`ClientRequest`]: `{"ok": true, ...}` or
/// `{"ok": false, "reason": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailureReason>,
    // Flattened: `None` contributes no fields at all.
    #[serde(flatten)]
    pub data: Option<AckData>,
}

impl Ack {
    pub fn ok() -> Self {
        Self { ok: true, reason: None, data: None }
    }

    pub fn ok_with(data: AckData) -> Self {
        Self { ok: true, reason: None, data: Some(data) }
    }

    pub fn fail(reason: FailureReason) -> Self {
        Self { ok: false, reason: Some(reason), data: None }
    }
}

// ---------------------------------------------------------------------------
// Server → client events
// ---------------------------------------------------------------------------

/// A broadcast emitted by a session. Depending on the event this goes to
/// the whole room, to the players only, to the host only, or to a single
/// connection — the session decides; the type carries no addressing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// The public roster, re-sent on every membership or score change.
    Roster { players: Vec<RosterEntry> },
    RoundStarted {
        round_type: QuestionKind,
        duration: u64,
    },
    /// Player view of a multiple-choice question (no answer).
    ChoiceQuestion {
        text: String,
        choices: Vec<String>,
        seconds: u64,
        round_totals: Vec<ScoreEntry>,
    },
    /// Player view of a buzzer question.
    BuzzerQuestion { text: String },
    /// Player view of a sequence question: only the revealed prefix.
    SequenceQuestion {
        text: String,
        visible_steps: Vec<String>,
    },
    /// Host view of the current question, answer and all.
    HostQuestion { question: QuestionSpec },
    CountdownTick { seconds: u64 },
    TimeUp,
    BuzzerReset,
    BuzzRegistered { buzzer: BuzzSeat },
    /// Targeted at one player: their own lockout state.
    BuzzerLockStatus { locked: bool },
    /// Room-wide notice that a player was locked out of further buzzing.
    BuzzerLockout { id: ConnectionId, name: String },
    /// Someone answered — name only, never the content.
    PlayerAnswered { name: String },
    AllAnswered { count: usize },
    /// Preview of the outcome: provisional scores, nothing committed yet.
    AnswerRevealed {
        answer: String,
        question_scores: Vec<ScoreEntry>,
        round_totals: Vec<ScoreEntry>,
    },
    /// Roster after the host confirmed points.
    ScoreUpdate { players: Vec<RosterEntry> },
    RoundFinalScores { round_scores: Vec<ScoreEntry> },
    RoundLeaderboard { entries: Vec<ScoreEntry> },
    FullLeaderboard { players: Vec<RosterEntry> },
    ShowEnded { players: Vec<RosterEntry> },
    SequenceStepRevealed {
        step_index: usize,
        step: String,
        visible_steps: Vec<String>,
    },
    SequenceAnswerRevealed {
        answer: String,
        steps: Vec<String>,
    },
    HostLeft,
}

/// Top-level server → client frame: either the reply to your own request
/// or a room event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "body", rename_all = "camelCase")]
pub enum ServerMessage {
    Ack(Ack),
    Event(ServerEvent),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Wire-shape tests. The clients parse these exact JSON forms, so a
    //! serde attribute change that alters them is a breaking change.

    use super::*;

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_connection_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&ConnectionId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId(7).to_string(), "conn-7");
    }

    #[test]
    fn test_room_code_uppercased_and_transparent() {
        let code = RoomCode::new("ab12");
        assert_eq!(code.as_str(), "AB12");
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"AB12\"");
    }

    #[test]
    fn test_role_defaults_to_player() {
        assert_eq!(Role::default(), Role::Player);
        assert_eq!(serde_json::to_string(&Role::Host).unwrap(), "\"host\"");
    }

    // =====================================================================
    // AnswerValue + normalization
    // =====================================================================

    #[test]
    fn test_answer_value_accepts_both_wire_forms() {
        let idx: AnswerValue = serde_json::from_str("1").unwrap();
        assert_eq!(idx, AnswerValue::Index(1));

        let text: AnswerValue = serde_json::from_str("\"Jupiter\"").unwrap();
        assert_eq!(text, AnswerValue::Text("Jupiter".into()));
    }

    #[test]
    fn test_normalize_text_trims_and_lowercases() {
        let n = normalize_answer(&AnswerValue::Text("  JuPiTer ".into()), &[]);
        assert_eq!(n.as_deref(), Some("jupiter"));
    }

    #[test]
    fn test_normalize_index_resolves_through_choices() {
        let choices = vec!["Mars".to_string(), " Jupiter ".to_string()];
        let n = normalize_answer(&AnswerValue::Index(1), &choices);
        assert_eq!(n.as_deref(), Some("jupiter"));
    }

    #[test]
    fn test_normalize_index_out_of_range_is_none() {
        let choices = vec!["Mars".to_string()];
        assert_eq!(normalize_answer(&AnswerValue::Index(5), &choices), None);
    }

    // =====================================================================
    // QuestionSpec
    // =====================================================================

    fn sample_choice_question() -> QuestionSpec {
        QuestionSpec::MultipleChoice {
            text: "Largest planet?".into(),
            choices: vec!["Mars".into(), "Jupiter".into()],
            correct: 1,
        }
    }

    #[test]
    fn test_question_spec_tagged_json_format() {
        let json: serde_json::Value =
            serde_json::to_value(sample_choice_question()).unwrap();
        assert_eq!(json["type"], "multipleChoice");
        assert_eq!(json["correct"], 1);
        assert_eq!(json["choices"][1], "Jupiter");
    }

    #[test]
    fn test_question_spec_sequence_step_points_optional() {
        let json = r#"{
            "type": "sequence",
            "text": "Name the year",
            "answer": "1969",
            "steps": ["Moon landing", "Woodstock announced"]
        }"#;
        let q: QuestionSpec = serde_json::from_str(json).unwrap();
        assert!(matches!(q, QuestionSpec::Sequence { ref step_points, .. } if step_points.is_empty()));
    }

    #[test]
    fn test_normalized_answer_per_variant() {
        assert_eq!(
            sample_choice_question().normalized_answer().as_deref(),
            Some("jupiter")
        );
        let buzzer = QuestionSpec::Buzzer {
            text: "?".into(),
            answer: " Apollo 11 ".into(),
        };
        assert_eq!(buzzer.normalized_answer().as_deref(), Some("apollo 11"));
    }

    #[test]
    fn test_normalized_answer_bad_correct_index_is_none() {
        let q = QuestionSpec::MultipleChoice {
            text: "?".into(),
            choices: vec!["a".into()],
            correct: 9,
        };
        assert_eq!(q.normalized_answer(), None);
        assert_eq!(q.display_answer(), "");
    }

    // =====================================================================
    // Requests
    // =====================================================================

    #[test]
    fn test_client_request_join_room_json_format() {
        let json = r#"{"type": "joinRoom", "room": "ab12", "name": "Ann"}"#;
        let req: ClientRequest = serde_json::from_str(json).unwrap();
        match req {
            ClientRequest::JoinRoom { room, name, role } => {
                assert_eq!(room.as_str(), "AB12");
                assert_eq!(name, "Ann");
                assert_eq!(role, Role::Player); // defaulted
            }
            other => panic!("expected JoinRoom, got {other:?}"),
        }
    }

    #[test]
    fn test_client_request_reset_buzzer_field_names() {
        let req = ClientRequest::ResetBuzzer { all: false, preserve_locks: true };
        let json: serde_json::Value = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "resetBuzzer");
        assert_eq!(json["preserveLocks"], true);
    }

    #[test]
    fn test_client_request_confirm_points_accepts_arbitrary_values() {
        let json = r#"{"type": "confirmPoints", "scores": {"3": 10, "4": "oops"}}"#;
        let req: ClientRequest = serde_json::from_str(json).unwrap();
        match req {
            ClientRequest::ConfirmPoints { scores } => {
                assert_eq!(scores[&ConnectionId(3)], serde_json::json!(10));
                assert_eq!(scores[&ConnectionId(4)], serde_json::json!("oops"));
            }
            other => panic!("expected ConfirmPoints, got {other:?}"),
        }
    }

    #[test]
    fn test_client_request_unknown_type_is_rejected() {
        let result: Result<ClientRequest, _> =
            serde_json::from_str(r#"{"type": "flyToMoon"}"#);
        assert!(result.is_err());
    }

    // =====================================================================
    // Acks
    // =====================================================================

    #[test]
    fn test_ack_ok_omits_reason_and_payload() {
        let json = serde_json::to_string(&Ack::ok()).unwrap();
        assert_eq!(json, r#"{"ok":true}"#);
    }

    #[test]
    fn test_ack_payload_is_flattened() {
        let ack = Ack::ok_with(AckData::Room { room: RoomCode::new("AB12") });
        let json: serde_json::Value = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["ok"], true);
        assert_eq!(json["room"], "AB12");
    }

    #[test]
    fn test_ack_failure_reason_names() {
        let ack = Ack::fail(FailureReason::TooLate);
        let json: serde_json::Value = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["ok"], false);
        assert_eq!(json["reason"], "tooLate");

        let early: serde_json::Value =
            serde_json::to_value(Ack::fail(FailureReason::EarlyReveal)).unwrap();
        assert_eq!(early["reason"], "early");

        let steps: serde_json::Value =
            serde_json::to_value(Ack::fail(FailureReason::NoMoreSteps)).unwrap();
        assert_eq!(steps["reason"], "noMoreSteps");
    }

    #[test]
    fn test_ack_step_index_field_name() {
        let ack = Ack::ok_with(AckData::StepIndex { revealed_step_index: 2 });
        let json: serde_json::Value = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["revealedStepIndex"], 2);
    }

    // =====================================================================
    // Events and the top-level frame
    // =====================================================================

    #[test]
    fn test_server_event_tagged_json_format() {
        let event = ServerEvent::CountdownTick { seconds: 12 };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "countdownTick");
        assert_eq!(json["seconds"], 12);
    }

    #[test]
    fn test_server_event_choice_question_hides_nothing_it_should_carry() {
        let event = ServerEvent::ChoiceQuestion {
            text: "Largest planet?".into(),
            choices: vec!["Mars".into(), "Jupiter".into()],
            seconds: 30,
            round_totals: vec![],
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "choiceQuestion");
        assert_eq!(json["roundTotals"], serde_json::json!([]));
        // The player view must never include the answer.
        assert!(json.get("correct").is_none());
        assert!(json.get("answer").is_none());
    }

    #[test]
    fn test_server_message_frame_round_trip() {
        let msg = ServerMessage::Event(ServerEvent::BuzzRegistered {
            buzzer: BuzzSeat { id: ConnectionId(3), name: "Ann".into(), ts: 1000 },
        });
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "event");
        assert_eq!(json["body"]["type"], "buzzRegistered");

        let bytes = serde_json::to_vec(&msg).unwrap();
        let decoded: ServerMessage = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn test_server_message_ack_frame() {
        let msg = ServerMessage::Ack(Ack::fail(FailureReason::RoomNotFound));
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["kind"], "ack");
        assert_eq!(json["body"]["reason"], "roomNotFound");
    }
}
