//! Per-participant state.

use gameshow_protocol::Role;

/// One participant in a session (the host has an entry too, with role
/// Host).
///
/// `score` is the cumulative total across rounds and survives a re-join by
/// the same connection. `buzzer_locked` is the individual lockout toggled
/// by the buzzer arbitration; it resets at question boundaries.
#[derive(Debug, Clone)]
pub struct Player {
    pub name: String,
    pub score: i64,
    pub role: Role,
    pub buzzer_locked: bool,
    /// Insertion counter; keeps equal-score orderings stable.
    pub(crate) join_order: u64,
}
