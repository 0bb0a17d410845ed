//! Question lifecycle: starting rounds, dealing questions, collecting
//! answers, revealing results.
//!
//! Each question variant has its own opening choreography (who sees what,
//! whether a deadline is set) but shares the same skeleton: clear the
//! previous question's state, open the new one, tell the host everything
//! and the players only what they may know.

use std::time::Duration;

use gameshow_protocol::{
    AckData, AnswerValue, QuestionKind, QuestionSpec, Role, ServerEvent, normalize_answer,
};
use tokio::time::Instant;

use crate::session::{Audience, Outcome, TimerCmd};
use crate::{GameError, Round, RoundPhase, Session};

impl Session {
    /// Opens a fresh round of the given type. Any round already running is
    /// replaced — its scores are gone, its countdown is cancelled.
    pub(crate) fn start_round(
        &mut self,
        conn: gameshow_protocol::ConnectionId,
        kind: QuestionKind,
        duration: u64,
    ) -> Result<Outcome, GameError> {
        self.require_host(conn)?;

        self.round = Some(Round::new(kind, duration));
        tracing::info!(room = %self.code(), round_type = %kind, duration, "round started");

        let mut out = Outcome::default();
        out.timer = TimerCmd::Cancel;
        out.push(Audience::Room, ServerEvent::RoundStarted { round_type: kind, duration });
        Ok(out)
    }

    /// Deals the next question. The question's type must match the round's.
    pub(crate) fn start_question(
        &mut self,
        conn: gameshow_protocol::ConnectionId,
        question: QuestionSpec,
        now: Instant,
    ) -> Result<Outcome, GameError> {
        self.require_host(conn)?;
        {
            let round = self.round.as_ref().ok_or(GameError::NoActiveRound)?;
            if question.kind() != round.kind {
                return Err(GameError::InvalidQuestionType);
            }
        }

        let round_totals = self.round_totals();
        let window_secs = self.config.answer_window_secs;
        let window = Duration::from_secs(window_secs);
        let kind = question.kind();

        let mut out = Outcome::default();
        // Whatever countdown the previous question left behind dies here;
        // a multiple-choice question arms a fresh one below.
        out.timer = TimerCmd::Cancel;

        let Session { players, round, .. } = self;
        let Some(round) = round.as_mut() else {
            return Err(GameError::NoActiveRound);
        };

        round.clear_question_state();
        round.phase = RoundPhase::QuestionOpen;

        match &question {
            QuestionSpec::MultipleChoice { text, choices, .. } => {
                round.ends_at = Some(now + window);
                out.timer = TimerCmd::Arm(window);
                out.push(
                    Audience::Host,
                    ServerEvent::HostQuestion { question: question.clone() },
                );
                out.push(
                    Audience::Players,
                    ServerEvent::ChoiceQuestion {
                        text: text.clone(),
                        choices: choices.clone(),
                        seconds: window_secs,
                        round_totals,
                    },
                );
            }
            QuestionSpec::Buzzer { text, .. } => {
                for player in players.values_mut() {
                    player.buzzer_locked = false;
                }
                round.clear_buzzer_seat();
                round.buzzers_locked = false;
                out.push(Audience::Room, ServerEvent::BuzzerReset);
                out.push(Audience::Players, ServerEvent::BuzzerQuestion { text: text.clone() });
                out.push(
                    Audience::Host,
                    ServerEvent::HostQuestion { question: question.clone() },
                );
            }
            QuestionSpec::Sequence { text, steps, .. } => {
                for player in players.values_mut() {
                    player.buzzer_locked = false;
                }
                round.clear_buzzer_seat();
                round.buzzers_locked = false;
                out.push(
                    Audience::Players,
                    ServerEvent::SequenceQuestion {
                        text: text.clone(),
                        visible_steps: steps.first().cloned().into_iter().collect(),
                    },
                );
                out.push(
                    Audience::Host,
                    ServerEvent::HostQuestion { question: question.clone() },
                );
            }
        }

        round.question = Some(question);
        tracing::debug!(room = %self.code(), question_kind = %kind, "question opened");
        Ok(out)
    }

    /// Records a player's answer and scores it provisionally.
    pub(crate) fn submit_answer(
        &mut self,
        conn: gameshow_protocol::ConnectionId,
        answer: AnswerValue,
        now: Instant,
    ) -> Result<Outcome, GameError> {
        {
            let round = self.round.as_ref().ok_or(GameError::NoActiveRound)?;
            if round.question.is_none() {
                return Err(GameError::NoActiveRound);
            }
            if round.deadline_passed(now) {
                return Err(GameError::TooLate);
            }
        }

        let mut out = Outcome::default();

        // The answers map only ever holds role-Player entries; a host
        // submission acknowledges fine but records nothing.
        if !self.players.get(&conn).is_some_and(|p| p.role == Role::Player) {
            return Ok(out);
        }

        let name = self.player_name(conn);
        let provisional = self.config.provisional_points;
        let player_ids = self.player_ids();

        let Some(round) = self.round.as_mut() else {
            return Err(GameError::NoActiveRound);
        };
        let Some(question) = round.question.as_ref() else {
            return Err(GameError::NoActiveRound);
        };

        // Provisional score: flat points on a normalized match, 0 on a
        // mismatch or on anything that fails to normalize.
        let submitted = normalize_answer(&answer, question.choices());
        let score = match (submitted, question.normalized_answer()) {
            (Some(s), Some(c)) if s == c => provisional,
            _ => 0,
        };

        round.answers.insert(conn, answer);
        round.question_scores.insert(conn, score);

        out.push(Audience::Room, ServerEvent::PlayerAnswered { name });

        if !round.all_answered
            && player_ids.iter().all(|id| round.answers.contains_key(id))
        {
            round.all_answered = true;
            out.timer = TimerCmd::Cancel;
            out.push(
                Audience::Room,
                ServerEvent::AllAnswered { count: round.answers.len() },
            );
        }

        Ok(out)
    }

    /// Shows the correct answer and the provisional scores — a preview
    /// only; cumulative totals move when the host confirms points.
    pub(crate) fn reveal_answer(
        &mut self,
        conn: gameshow_protocol::ConnectionId,
        now: Instant,
    ) -> Result<Outcome, GameError> {
        self.require_host(conn)?;

        let (answer, question_scores, round_totals) = {
            let round = self.round.as_ref().ok_or(GameError::NoActiveRound)?;
            let question = round.question.as_ref().ok_or(GameError::NoActiveRound)?;

            let ready = round.all_answered
                || question.kind() == QuestionKind::Buzzer
                || round.deadline_passed(now);
            if !ready {
                return Err(GameError::EarlyReveal);
            }

            (
                question.display_answer(),
                self.score_entries(&round.question_scores),
                self.score_entries(&round.round_scores),
            )
        };

        let Some(round) = self.round.as_mut() else {
            return Err(GameError::NoActiveRound);
        };
        round.phase = RoundPhase::AnswerRevealed;
        round.buzzers_locked = true;

        let mut out = Outcome::default();
        out.push(
            Audience::Room,
            ServerEvent::AnswerRevealed { answer, question_scores, round_totals },
        );
        Ok(out)
    }

    /// Reveals the next sequence step to the room.
    pub(crate) fn reveal_next_step(
        &mut self,
        conn: gameshow_protocol::ConnectionId,
    ) -> Result<Outcome, GameError> {
        self.require_host(conn)?;

        let (next, step, visible_steps) = {
            let round = self.round.as_ref().ok_or(GameError::NoActiveRound)?;
            let Some(QuestionSpec::Sequence { steps, .. }) = round.question.as_ref() else {
                return Err(GameError::InvalidQuestionType);
            };
            if round.revealed_step_index + 1 >= steps.len() {
                return Err(GameError::NoMoreSteps);
            }
            let next = round.revealed_step_index + 1;
            (next, steps[next].clone(), steps[..=next].to_vec())
        };

        let Some(round) = self.round.as_mut() else {
            return Err(GameError::NoActiveRound);
        };
        round.revealed_step_index = next;

        let mut out = Outcome::default();
        out.data = Some(AckData::StepIndex { revealed_step_index: next });
        out.push(
            Audience::Room,
            ServerEvent::SequenceStepRevealed { step_index: next, step, visible_steps },
        );
        Ok(out)
    }

    /// Publishes a sequence question's full step list and answer — the
    /// host's cue that scoring is about to happen.
    pub(crate) fn reveal_sequence_answer(
        &mut self,
        conn: gameshow_protocol::ConnectionId,
    ) -> Result<Outcome, GameError> {
        self.require_host(conn)?;

        let (answer, steps) = {
            let round = self.round.as_ref().ok_or(GameError::NoActiveRound)?;
            let Some(QuestionSpec::Sequence { answer, steps, .. }) = round.question.as_ref()
            else {
                return Err(GameError::InvalidQuestionType);
            };
            (answer.clone(), steps.clone())
        };

        let Some(round) = self.round.as_mut() else {
            return Err(GameError::NoActiveRound);
        };
        round.phase = RoundPhase::AnswerRevealed;
        round.buzzers_locked = true;

        let mut out = Outcome::default();
        out.push(Audience::Room, ServerEvent::SequenceAnswerRevealed { answer, steps });
        Ok(out)
    }
}

// =========================================================================
// Tests
// =========================================================================
