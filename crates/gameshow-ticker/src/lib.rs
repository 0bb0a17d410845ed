//! Cancellable countdown driver for timed questions.
//!
//! A [`Countdown`] is owned by exactly one session actor and drives the
//! answer-window broadcasts: every period (500 ms by default) it yields the
//! remaining whole seconds, and when the deadline passes it yields
//! [`CountdownSignal::Expired`] once and disarms itself.
//!
//! # Integration
//!
//! The countdown is designed to sit inside the actor's `tokio::select!`
//! loop. While disarmed, [`Countdown::next_signal`] pends forever, so the
//! branch simply never fires:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         sig = countdown.next_signal() => { /* broadcast tick / time-up */ }
//!     }
//! }
//! ```
//!
//! Because the owning actor polls it directly, cancelling is a synchronous
//! field write — there is no spawned task that could outlive the round
//! that armed it.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

/// Default broadcast period: twice a second.
pub const DEFAULT_PERIOD: Duration = Duration::from_millis(500);

/// What the countdown produced this period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownSignal {
    /// The deadline has not passed; this many whole seconds remain.
    Tick { remaining_secs: u64 },
    /// The deadline passed. Emitted once; the countdown disarms itself.
    Expired,
}

/// A periodic countdown toward a single deadline.
#[derive(Debug)]
pub struct Countdown {
    deadline: Option<Instant>,
    period: Duration,
    /// When the next signal is due. Kept here (not in the future) so that
    /// dropping and re-creating `next_signal` — which `tokio::select!`
    /// does on every competing event — never restarts the period.
    next_fire: Option<Instant>,
}

impl Countdown {
    pub fn new() -> Self {
        Self::with_period(DEFAULT_PERIOD)
    }

    pub fn with_period(period: Duration) -> Self {
        Self { deadline: None, period, next_fire: None }
    }

    /// Arms the countdown toward `deadline`, replacing any previous one.
    pub fn arm(&mut self, deadline: Instant) {
        let now = Instant::now();
        debug!(
            remaining_ms = %deadline.saturating_duration_since(now).as_millis(),
            "countdown armed"
        );
        self.deadline = Some(deadline);
        self.next_fire = Some(now + self.period);
    }

    /// Arms the countdown to expire `window` from now.
    pub fn arm_in(&mut self, window: Duration) {
        self.arm(Instant::now() + window);
    }

    /// Disarms the countdown. Safe to call when already idle (idempotent).
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            debug!("countdown cancelled");
        }
        self.next_fire = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Waits until the next period boundary and reports the remaining time.
    ///
    /// While disarmed this future pends forever — it never resolves on its
    /// own, but a surrounding `tokio::select!` still processes its other
    /// branches. After yielding [`CountdownSignal::Expired`] the countdown
    /// is disarmed, so the signal fires at most once per armed deadline.
    pub async fn next_signal(&mut self) -> CountdownSignal {
        let (deadline, next_fire) = match (self.deadline, self.next_fire) {
            (Some(deadline), Some(next_fire)) => (deadline, next_fire),
            _ => {
                // Idle: pend forever, select! handles the other branches.
                std::future::pending::<()>().await;
                unreachable!()
            }
        };

        time::sleep_until(next_fire).await;

        let now = Instant::now();
        let remaining = remaining_seconds(deadline, now);
        trace!(remaining, "countdown period elapsed");

        if remaining == 0 {
            self.deadline = None;
            self.next_fire = None;
            CountdownSignal::Expired
        } else {
            self.next_fire = Some(now + self.period);
            CountdownSignal::Tick { remaining_secs: remaining }
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole seconds remaining until `deadline`, rounded to nearest.
///
/// 29.5 s reads as 30; anything at or past the deadline reads as 0.
pub fn remaining_seconds(deadline: Instant, now: Instant) -> u64 {
    if now >= deadline {
        return 0;
    }
    let ms = (deadline - now).as_millis() as f64;
    (ms / 1000.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remaining_seconds_rounds_to_nearest() {
        let now = Instant::now();
        assert_eq!(remaining_seconds(now + Duration::from_millis(29_500), now), 30);
        assert_eq!(remaining_seconds(now + Duration::from_millis(29_400), now), 29);
        assert_eq!(remaining_seconds(now + Duration::from_millis(500), now), 1);
    }

    #[tokio::test]
    async fn test_remaining_seconds_zero_at_or_past_deadline() {
        let now = Instant::now();
        assert_eq!(remaining_seconds(now, now), 0);
        assert_eq!(remaining_seconds(now - Duration::from_secs(3), now), 0);
    }

    #[tokio::test]
    async fn test_arm_and_cancel_toggle_state() {
        let mut cd = Countdown::new();
        assert!(!cd.is_armed());

        cd.arm_in(Duration::from_secs(30));
        assert!(cd.is_armed());

        cd.cancel();
        assert!(!cd.is_armed());

        // Cancelling again is a no-op.
        cd.cancel();
        assert!(!cd.is_armed());
    }
}
