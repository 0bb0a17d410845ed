//! `GameshowServer` builder and accept loop.

use std::sync::Arc;

use gameshow_protocol::JsonCodec;
use gameshow_questions::QuestionBank;
use gameshow_session::{SessionConfig, SessionRegistry};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::ServerError;
use crate::hub::handle_connection;

/// Shared state handed to every connection task.
pub(crate) struct HubState {
    pub(crate) registry: Mutex<SessionRegistry>,
    pub(crate) bank: Arc<dyn QuestionBank>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Gameshow server.
///
/// # Example
///
/// ```rust,no_run
/// use gameshow::GameshowServer;
/// use gameshow_questions::StaticBank;
///
/// # async fn run() -> Result<(), gameshow::ServerError> {
/// let server = GameshowServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(StaticBank::default())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct GameshowServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
}

impl GameshowServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
        }
    }

    /// Sets the address to listen on.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Overrides the per-session tunables.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Binds the listener and assembles the server around a question bank.
    pub async fn build(self, bank: impl QuestionBank) -> Result<GameshowServer, ServerError> {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        tracing::info!(addr = %self.bind_addr, "listening");

        let state = Arc::new(HubState {
            registry: Mutex::new(SessionRegistry::new(self.session_config)),
            bank: Arc::new(bank),
            codec: JsonCodec,
        });

        Ok(GameshowServer { listener, state })
    }
}

impl Default for GameshowServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Gameshow server.
pub struct GameshowServer {
    listener: TcpListener,
    state: Arc<HubState>,
}

impl GameshowServer {
    pub fn builder() -> GameshowServerBuilder {
        GameshowServerBuilder::new()
    }

    /// The address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever, one task per socket.
    pub async fn run(self) -> Result<(), ServerError> {
        loop {
            let (stream, addr) = self.listener.accept().await?;
            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                match tokio_tungstenite::accept_async(stream).await {
                    Ok(ws) => {
                        if let Err(e) = handle_connection(ws, state).await {
                            tracing::debug!(%addr, error = %e, "connection handler failed");
                        }
                    }
                    Err(e) => {
                        tracing::debug!(%addr, error = %e, "websocket handshake failed");
                    }
                }
            });
        }
    }
}
