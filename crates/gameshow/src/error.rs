//! Unified error type for the server crate.

use gameshow_protocol::ProtocolError;

/// Top-level error for running the server.
///
/// Per-request game failures never surface here — those travel back to the
/// caller as acknowledgments. This type covers what can actually kill a
/// listener or a connection task.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Socket-level failure (bind, accept, read, write).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wire encode/decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
