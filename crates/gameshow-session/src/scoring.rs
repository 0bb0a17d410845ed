//! The scoring ledger: the only code that moves player totals.
//!
//! A confirmed delta lands in the round tally and the cumulative score in
//! the same call, by the same amount — nothing else in the crate writes to
//! either. Confirmation is additive, so the host client must send each
//! confirmation once; everything else here is an absolute assignment and
//! safe to re-issue.

use std::collections::HashMap;

use gameshow_protocol::{ConnectionId, ScoreEntry, ServerEvent};

use crate::session::{Audience, Outcome, TimerCmd};
use crate::{GameError, RoundPhase, Session};

/// Reads a point delta out of whatever JSON the host client sent.
/// Integers pass through, floats are rounded, anything else counts as 0.
fn coerce_delta(raw: &serde_json::Value) -> i64 {
    if let Some(n) = raw.as_i64() {
        n
    } else if let Some(f) = raw.as_f64() {
        f.round() as i64
    } else {
        0
    }
}

impl Session {
    /// Applies the host's confirmed deltas and closes out the question.
    ///
    /// Deltas for connections that are not in the roster are skipped: the
    /// round tally and the cumulative score move together or not at all.
    pub(crate) fn confirm_points(
        &mut self,
        conn: ConnectionId,
        scores: &HashMap<ConnectionId, serde_json::Value>,
    ) -> Result<Outcome, GameError> {
        self.require_host(conn)?;

        {
            let Session { players, round, .. } = self;
            let round = round.as_mut().ok_or(GameError::NoActiveRound)?;

            for (sid, raw) in scores {
                let delta = coerce_delta(raw);
                let Some(player) = players.get_mut(sid) else {
                    tracing::debug!(%sid, "delta for unknown connection, skipped");
                    continue;
                };
                *round.round_scores.entry(*sid).or_insert(0) += delta;
                player.score += delta;
            }

            round.question_index += 1;
            round.clear_question_state();
            round.clear_buzzer_seat();
            round.buzzers_locked = false;
            round.phase = RoundPhase::ScoresConfirmed;
        }

        tracing::info!(room = %self.code(), confirmed = scores.len(), "points confirmed");

        let mut out = Outcome::default();
        out.timer = TimerCmd::Cancel;
        out.push(Audience::Room, ServerEvent::ScoreUpdate { players: self.roster() });
        Ok(out)
    }

    /// Ends the round: final round scores, a round leaderboard, and the
    /// round itself is gone.
    pub(crate) fn end_round(&mut self, conn: ConnectionId) -> Result<Outcome, GameError> {
        self.require_host(conn)?;
        let round_scores = {
            let round = self.round.as_ref().ok_or(GameError::NoActiveRound)?;
            self.score_entries(&round.round_scores)
        };

        let mut leaderboard = round_scores.clone();
        sort_stable_by_points(&mut leaderboard);

        self.round = None;
        tracing::info!(room = %self.code(), "round ended");

        let mut out = Outcome::default();
        out.timer = TimerCmd::Cancel;
        out.push(Audience::Room, ServerEvent::RoundFinalScores { round_scores });
        out.push(Audience::Room, ServerEvent::RoundLeaderboard { entries: leaderboard });
        Ok(out)
    }

    /// Broadcasts the cumulative scoreboard mid-show.
    pub(crate) fn show_full_leaderboard(
        &mut self,
        conn: ConnectionId,
    ) -> Result<Outcome, GameError> {
        self.require_host(conn)?;
        let mut out = Outcome::default();
        out.push(
            Audience::Room,
            ServerEvent::FullLeaderboard { players: self.scoreboard() },
        );
        Ok(out)
    }

    /// Broadcasts the final scoreboard. Same payload as the full
    /// leaderboard under its own event name so the clients can switch to
    /// their end-of-show screen.
    pub(crate) fn end_show(&mut self, conn: ConnectionId) -> Result<Outcome, GameError> {
        self.require_host(conn)?;
        tracing::info!(room = %self.code(), "show ended");
        let mut out = Outcome::default();
        out.timer = TimerCmd::Cancel;
        out.push(Audience::Room, ServerEvent::ShowEnded { players: self.scoreboard() });
        Ok(out)
    }

    /// The whole roster ordered by cumulative score, ties in join order.
    fn scoreboard(&self) -> Vec<gameshow_protocol::RosterEntry> {
        let mut entries = self.roster();
        entries.sort_by_key(|e| std::cmp::Reverse(e.score));
        entries
    }
}

/// Descending by points; `sort_by_key` is stable, so equal scores keep
/// their join order from `score_entries`.
fn sort_stable_by_points(entries: &mut [ScoreEntry]) {
    entries.sort_by_key(|e| std::cmp::Reverse(e.points));
}

// =========================================================================
// Tests
// =========================================================================
