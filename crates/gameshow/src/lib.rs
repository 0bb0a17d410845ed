//! # Gameshow
//!
//! A live trivia/game-show server: one host drives rounds of questions
//! over WebSocket while players answer, buzz in, and accumulate scores.
//!
//! This crate is the outermost layer — the channel hub. It owns the
//! listener, the per-connection tasks, and the routing into the session
//! engine; the game rules themselves live in `gameshow-session`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use gameshow::GameshowServer;
//! use gameshow_questions::StaticBank;
//!
//! # async fn run() -> Result<(), gameshow::ServerError> {
//! let bank = StaticBank::from_json(include_str!("../../../demos/trivia-night/questions.json"))
//!     .expect("bundled bank parses");
//! let server = GameshowServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(bank)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod hub;
mod server;

pub use error::ServerError;
pub use server::{GameshowServer, GameshowServerBuilder};

/// One-stop imports for server binaries and tests.
pub mod prelude {
    pub use gameshow_protocol::{
        Ack, AckData, AnswerValue, ClientRequest, ConnectionId, FailureReason,
        QuestionKind, QuestionSpec, Role, RoomCode, ServerEvent, ServerMessage,
    };
    pub use gameshow_questions::{BankError, QuestionBank, StaticBank};
    pub use gameshow_session::SessionConfig;

    pub use crate::{GameshowServer, GameshowServerBuilder, ServerError};
}
