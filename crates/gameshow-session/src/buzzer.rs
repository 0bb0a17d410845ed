//! Buzzer arbitration: at most one buzzed-in player at a time.
//!
//! The actor processes one action to completion before the next, so the
//! first successful `buzz` wins outright — there is no retry, no replay,
//! and no tie to break. Everything here is an absolute state assignment,
//! which is what makes a re-sent reset harmless.

use std::time::{SystemTime, UNIX_EPOCH};

use gameshow_protocol::{AckData, BuzzSeat, ConnectionId, ServerEvent};

use crate::session::{Audience, Outcome};
use crate::{GameError, Session};

/// Wall-clock milliseconds for the buzz timestamp shown to the room.
fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl Session {
    /// Claims the buzzer. Checks, in order: an active round exists, the
    /// round-wide lock is open, the caller is not individually locked out,
    /// and nobody holds the seat yet.
    pub(crate) fn buzz(&mut self, conn: ConnectionId) -> Result<Outcome, GameError> {
        let name = self.player_name(conn);
        let locked_out = self.players.get(&conn).is_some_and(|p| p.buzzer_locked);

        let round = self.round.as_mut().ok_or(GameError::NoActiveRound)?;
        if round.buzzers_locked {
            return Err(GameError::BuzzersLocked);
        }
        if locked_out {
            return Err(GameError::LockedOut);
        }
        if round.buzzer.is_some() {
            return Err(GameError::AlreadyBuzzed);
        }

        let seat = BuzzSeat { id: conn, name, ts: unix_millis() };
        round.buzzer = Some(seat.clone());
        round.last_buzzed = Some(conn);
        tracing::debug!(room = %self.code(), %conn, "buzzed in");

        let mut out = Outcome::default();
        out.data = Some(AckData::Buzzer { buzzer: seat.clone() });
        out.push(Audience::Room, ServerEvent::BuzzRegistered { buzzer: seat });
        Ok(out)
    }

    /// Host-side buzzer reset. Three modes:
    ///
    /// - `all=true` — full reset: seat, round lock, and every individual
    ///   lockout are cleared; each player who was locked out is told so.
    /// - `all=false, preserve_locks=true` — soft reset: the seat is
    ///   cleared, lockouts stay, and every player is re-sent their current
    ///   lock state (a UI sync, not a state change).
    /// - `all=false, preserve_locks=false` — advance-and-lock: the
    ///   previous holder is locked out of further buzzing and the room is
    ///   told who; then the seat is cleared.
    ///
    /// Every mode finishes with a generic buzzer-reset broadcast.
    pub(crate) fn reset_buzzer(
        &mut self,
        conn: ConnectionId,
        all: bool,
        preserve_locks: bool,
    ) -> Result<Outcome, GameError> {
        self.require_host(conn)?;

        let mut out = Outcome::default();
        let Session { players, round, .. } = self;
        let round = round.as_mut().ok_or(GameError::NoActiveRound)?;

        if all {
            round.clear_buzzer_seat();
            round.buzzers_locked = false;
            for (id, player) in players.iter_mut() {
                if player.buzzer_locked {
                    player.buzzer_locked = false;
                    out.push(Audience::One(*id), ServerEvent::BuzzerLockStatus { locked: false });
                }
            }
        } else if preserve_locks {
            round.clear_buzzer_seat();
            for (id, player) in players.iter() {
                out.push(
                    Audience::One(*id),
                    ServerEvent::BuzzerLockStatus { locked: player.buzzer_locked },
                );
            }
        } else {
            if let Some(prev) = round.last_buzzed {
                if let Some(player) = players.get_mut(&prev) {
                    player.buzzer_locked = true;
                    out.push(
                        Audience::Room,
                        ServerEvent::BuzzerLockout { id: prev, name: player.name.clone() },
                    );
                }
            }
            round.clear_buzzer_seat();
            round.buzzers_locked = false;
        }

        out.push(Audience::Room, ServerEvent::BuzzerReset);
        tracing::debug!(room = %self.code(), all, preserve_locks, "buzzer reset");
        Ok(out)
    }
}

// =========================================================================
// Tests
// =========================================================================
