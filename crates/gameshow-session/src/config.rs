//! Session configuration.

use std::time::Duration;

/// Tunables for a session. One copy per session; the registry hands its
/// own copy to every session it creates.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Answer window for multiple-choice questions, in seconds. Fixed per
    /// question and independent of the round duration.
    pub answer_window_secs: u64,

    /// Flat provisional score for a correct answer. The preview shown on
    /// reveal; nothing is committed until the host confirms points.
    pub provisional_points: i64,

    /// How often the countdown broadcasts remaining seconds.
    pub countdown_period: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            answer_window_secs: 30,
            provisional_points: 10,
            countdown_period: Duration::from_millis(500),
        }
    }
}
