//! End-to-end game flows: once against the synchronous `Session`, once
//! through the registry and a live actor with real channels.

use std::time::Duration;

use gameshow_protocol::{
    AnswerValue, ClientRequest, ConnectionId, QuestionKind, QuestionSpec, Role, RoomCode,
    ServerEvent, ServerMessage,
};
use gameshow_session::{Session, SessionConfig, SessionRegistry};
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::Instant;

const HOST: ConnectionId = ConnectionId(1);
const ANN: ConnectionId = ConnectionId(2);
const BOB: ConnectionId = ConnectionId(3);

fn choice_question() -> QuestionSpec {
    QuestionSpec::MultipleChoice {
        text: "Largest planet?".into(),
        choices: vec!["Mars".into(), "Jupiter".into()],
        correct: 1,
    }
}

fn confirm(scores: &[(ConnectionId, i64)]) -> ClientRequest {
    ClientRequest::ConfirmPoints {
        scores: scores.iter().map(|(id, n)| (*id, json!(n))).collect(),
    }
}

// =========================================================================
// Synchronous end-to-end: host runs one multiple-choice question.
// =========================================================================

#[test]
fn test_multiple_choice_game_from_join_to_confirmed_scores() {
    let mut session = Session::new(RoomCode::new("AB12"), HOST, SessionConfig::default());
    session.join(HOST, "Quinn".into(), Role::Host).unwrap();
    session.join(ANN, "Ann".into(), Role::Player).unwrap();
    session.join(BOB, "Bob".into(), Role::Player).unwrap();

    let now = Instant::now();
    session
        .handle(HOST, ClientRequest::StartRound { round_type: QuestionKind::MultipleChoice, duration: 300 }, now)
        .unwrap();
    session
        .handle(HOST, ClientRequest::StartQuestion { question: choice_question() }, now)
        .unwrap();

    // Ann answers correctly, Bob does not; Bob's submission completes the set.
    session
        .handle(ANN, ClientRequest::SubmitAnswer { answer: AnswerValue::Index(1) }, now)
        .unwrap();
    let out = session
        .handle(BOB, ClientRequest::SubmitAnswer { answer: AnswerValue::Index(0) }, now)
        .unwrap();
    assert!(out.events.iter().any(|(_, e)| matches!(e, ServerEvent::AllAnswered { count: 2 })));

    // Reveal reports the provisional 10 / 0 preview.
    let out = session.handle(HOST, ClientRequest::RevealAnswer, now).unwrap();
    let revealed = out
        .events
        .iter()
        .find_map(|(_, e)| match e {
            ServerEvent::AnswerRevealed { answer, question_scores, .. } => {
                Some((answer.clone(), question_scores.clone()))
            }
            _ => None,
        })
        .expect("answer must be revealed");
    assert_eq!(revealed.0, "Jupiter");
    assert_eq!(revealed.1[0].points, 10);
    assert_eq!(revealed.1[1].points, 0);

    // Nothing committed yet.
    assert_eq!(session.player(ANN).unwrap().score, 0);

    // Confirmation commits exactly the host's deltas.
    session.handle(HOST, confirm(&[(ANN, 10), (BOB, 0)]), now).unwrap();
    assert_eq!(session.player(ANN).unwrap().score, 10);
    assert_eq!(session.player(BOB).unwrap().score, 0);
    assert_eq!(session.round().unwrap().question_index, 1);

    let roster = session.roster();
    let ann = roster.iter().find(|p| p.id == ANN).unwrap();
    assert_eq!(ann.score, 10);
}

#[test]
fn test_buzzer_scenario_first_wins_then_lockout_rotates() {
    let mut session = Session::new(RoomCode::new("AB12"), HOST, SessionConfig::default());
    session.join(HOST, "Quinn".into(), Role::Host).unwrap();
    session.join(ANN, "Ann".into(), Role::Player).unwrap();
    session.join(BOB, "Bob".into(), Role::Player).unwrap();

    let now = Instant::now();
    session
        .handle(HOST, ClientRequest::StartRound { round_type: QuestionKind::Buzzer, duration: 300 }, now)
        .unwrap();
    session
        .handle(
            HOST,
            ClientRequest::StartQuestion {
                question: QuestionSpec::Buzzer { text: "?".into(), answer: "x".into() },
            },
            now,
        )
        .unwrap();

    // Ann wins the buzzer; Bob is refused.
    assert!(session.handle(ANN, ClientRequest::Buzz, now).is_ok());
    let bob = session.handle(BOB, ClientRequest::Buzz, now);
    assert_eq!(bob.unwrap_err().reason(), gameshow_protocol::FailureReason::AlreadyBuzzed);

    // Advance-and-lock: Ann is out, Bob gets through.
    session
        .handle(HOST, ClientRequest::ResetBuzzer { all: false, preserve_locks: false }, now)
        .unwrap();
    let ann = session.handle(ANN, ClientRequest::Buzz, now);
    assert_eq!(ann.unwrap_err().reason(), gameshow_protocol::FailureReason::LockedOut);
    assert!(session.handle(BOB, ClientRequest::Buzz, now).is_ok());
}

// =========================================================================
// Actor-level flows with real channels.
// =========================================================================

type Outbound = mpsc::UnboundedReceiver<ServerMessage>;

fn drain(rx: &mut Outbound) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        if let ServerMessage::Event(event) = msg {
            events.push(event);
        }
    }
    events
}

async fn registry_with_three() -> (SessionRegistry, RoomCode, Outbound, Outbound, Outbound) {
    registry_with_three_config(SessionConfig::default()).await
}

async fn registry_with_three_config(
    config: SessionConfig,
) -> (SessionRegistry, RoomCode, Outbound, Outbound, Outbound) {
    let mut registry = SessionRegistry::new(config);

    let (host_tx, host_rx) = mpsc::unbounded_channel();
    let (ann_tx, ann_rx) = mpsc::unbounded_channel();
    let (bob_tx, bob_rx) = mpsc::unbounded_channel();

    let code = registry.create_session(HOST, host_tx.clone());
    assert!(registry.join_session(&code, HOST, "Quinn".into(), Role::Host, host_tx).await.ok);
    assert!(registry.join_session(&code, ANN, "Ann".into(), Role::Player, ann_tx).await.ok);
    assert!(registry.join_session(&code, BOB, "Bob".into(), Role::Player, bob_tx).await.ok);

    (registry, code, host_rx, ann_rx, bob_rx)
}

#[tokio::test]
async fn test_join_unknown_room_fails() {
    let mut registry = SessionRegistry::new(SessionConfig::default());
    let (tx, _rx) = mpsc::unbounded_channel();
    let ack = registry
        .join_session(&RoomCode::new("ZZZZ"), ANN, "Ann".into(), Role::Player, tx)
        .await;
    assert!(!ack.ok);
    assert_eq!(ack.reason, Some(gameshow_protocol::FailureReason::RoomNotFound));
}

#[tokio::test]
async fn test_room_code_is_short_and_typeable() {
    let mut registry = SessionRegistry::new(SessionConfig::default());
    let (tx, _rx) = mpsc::unbounded_channel();
    let code = registry.create_session(HOST, tx);
    assert_eq!(code.as_str().len(), 4);
    assert!(code.as_str().chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
}

#[tokio::test]
async fn test_question_views_are_role_scoped() {
    let (registry, _code, mut host_rx, mut ann_rx, _bob_rx) = registry_with_three().await;

    let ack = registry
        .act(HOST, ClientRequest::StartRound { round_type: QuestionKind::MultipleChoice, duration: 300 })
        .await;
    assert!(ack.ok);
    let ack = registry
        .act(HOST, ClientRequest::StartQuestion { question: choice_question() })
        .await;
    assert!(ack.ok);

    let host_events = drain(&mut host_rx);
    assert!(host_events.iter().any(|e| matches!(e, ServerEvent::HostQuestion { .. })));
    assert!(!host_events.iter().any(|e| matches!(e, ServerEvent::ChoiceQuestion { .. })));

    let ann_events = drain(&mut ann_rx);
    assert!(ann_events.iter().any(|e| matches!(e, ServerEvent::ChoiceQuestion { .. })));
    assert!(!ann_events.iter().any(|e| matches!(e, ServerEvent::HostQuestion { .. })));
}

#[tokio::test]
async fn test_confirmed_scores_reach_the_whole_room() {
    let (registry, _code, _host_rx, mut ann_rx, mut bob_rx) = registry_with_three().await;

    registry
        .act(HOST, ClientRequest::StartRound { round_type: QuestionKind::MultipleChoice, duration: 300 })
        .await;
    registry
        .act(HOST, ClientRequest::StartQuestion { question: choice_question() })
        .await;
    registry.act(ANN, ClientRequest::SubmitAnswer { answer: AnswerValue::Index(1) }).await;
    registry.act(BOB, ClientRequest::SubmitAnswer { answer: AnswerValue::Index(0) }).await;
    registry.act(HOST, ClientRequest::RevealAnswer).await;
    assert!(registry.act(HOST, confirm(&[(ANN, 10), (BOB, 0)])).await.ok);

    for rx in [&mut ann_rx, &mut bob_rx] {
        let events = drain(rx);
        let update = events
            .iter()
            .find_map(|e| match e {
                ServerEvent::ScoreUpdate { players } => Some(players.clone()),
                _ => None,
            })
            .expect("score update must reach every player");
        assert_eq!(update.iter().find(|p| p.id == ANN).unwrap().score, 10);
        assert_eq!(update.iter().find(|p| p.id == BOB).unwrap().score, 0);
    }
}

#[tokio::test]
async fn test_act_without_membership_fails() {
    let (registry, _code, _h, _a, _b) = registry_with_three().await;
    let ack = registry.act(ConnectionId(99), ClientRequest::Buzz).await;
    assert!(!ack.ok);
    assert_eq!(ack.reason, Some(gameshow_protocol::FailureReason::RoomNotFound));
}

#[tokio::test]
async fn test_host_disconnect_tears_the_room_down() {
    let (mut registry, _code, _host_rx, mut ann_rx, mut bob_rx) = registry_with_three().await;

    registry.disconnect(HOST).await;
    // Give the actor a moment to process the shutdown.
    tokio::task::yield_now().await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(registry.session_count(), 0);
    for rx in [&mut ann_rx, &mut bob_rx] {
        let events = drain(rx);
        assert!(events.iter().any(|e| matches!(e, ServerEvent::HostLeft)));
    }

    // The room is gone for everyone.
    let ack = registry.act(ANN, ClientRequest::Buzz).await;
    assert!(!ack.ok);
}

#[tokio::test]
async fn test_player_disconnect_rebroadcasts_roster() {
    let (mut registry, _code, mut host_rx, _ann_rx, _bob_rx) = registry_with_three().await;
    drain(&mut host_rx);

    registry.disconnect(BOB).await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let events = drain(&mut host_rx);
    let roster = events
        .iter()
        .find_map(|e| match e {
            ServerEvent::Roster { players } => Some(players.clone()),
            _ => None,
        })
        .expect("roster must be rebroadcast");
    assert!(roster.iter().all(|p| p.id != BOB));
}

// =========================================================================
// Countdown behavior through the actor, on a paused clock.
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_countdown_broadcasts_and_time_up() {
    let config = SessionConfig { answer_window_secs: 2, ..SessionConfig::default() };
    let (registry, _code, mut host_rx, _ann_rx, _bob_rx) =
        registry_with_three_config(config).await;

    registry
        .act(HOST, ClientRequest::StartRound { round_type: QuestionKind::MultipleChoice, duration: 300 })
        .await;
    registry
        .act(HOST, ClientRequest::StartQuestion { question: choice_question() })
        .await;

    // Let the whole window elapse.
    tokio::time::sleep(Duration::from_secs(3)).await;

    let events = drain(&mut host_rx);
    assert!(events.iter().any(|e| matches!(e, ServerEvent::CountdownTick { .. })));
    assert!(events.iter().any(|e| matches!(e, ServerEvent::TimeUp)));

    // Submissions after expiry are refused.
    let ack = registry.act(ANN, ClientRequest::SubmitAnswer { answer: AnswerValue::Index(1) }).await;
    assert!(!ack.ok);
    assert_eq!(ack.reason, Some(gameshow_protocol::FailureReason::TooLate));
}

#[tokio::test(start_paused = true)]
async fn test_all_answered_cancels_the_countdown() {
    let (registry, _code, mut host_rx, _ann_rx, _bob_rx) = registry_with_three().await;

    registry
        .act(HOST, ClientRequest::StartRound { round_type: QuestionKind::MultipleChoice, duration: 300 })
        .await;
    registry
        .act(HOST, ClientRequest::StartQuestion { question: choice_question() })
        .await;
    registry.act(ANN, ClientRequest::SubmitAnswer { answer: AnswerValue::Index(1) }).await;
    registry.act(BOB, ClientRequest::SubmitAnswer { answer: AnswerValue::Index(0) }).await;
    drain(&mut host_rx);

    // Way past the original 30 s window: a live countdown would have
    // fired time-up by now.
    tokio::time::sleep(Duration::from_secs(60)).await;

    let events = drain(&mut host_rx);
    assert!(
        !events.iter().any(|e| matches!(e, ServerEvent::TimeUp)),
        "countdown must be cancelled once everyone answered"
    );
}

#[tokio::test(start_paused = true)]
async fn test_new_question_replaces_previous_countdown() {
    let config = SessionConfig { answer_window_secs: 5, ..SessionConfig::default() };
    let (registry, _code, mut host_rx, _ann_rx, _bob_rx) =
        registry_with_three_config(config).await;

    registry
        .act(HOST, ClientRequest::StartRound { round_type: QuestionKind::MultipleChoice, duration: 300 })
        .await;
    registry
        .act(HOST, ClientRequest::StartQuestion { question: choice_question() })
        .await;

    // Replace the question mid-window; only one countdown may survive.
    tokio::time::sleep(Duration::from_secs(2)).await;
    registry
        .act(HOST, ClientRequest::StartQuestion { question: choice_question() })
        .await;
    tokio::time::sleep(Duration::from_secs(6)).await;

    let events = drain(&mut host_rx);
    let time_ups = events.iter().filter(|e| matches!(e, ServerEvent::TimeUp)).count();
    assert_eq!(time_ups, 1, "exactly one countdown may reach zero");
}
