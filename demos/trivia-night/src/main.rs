//! Trivia-night demo server: the full stack with a bundled question bank.
//!
//! Run it, open a room from the host client, and share the code. Set
//! `GAMESHOW_ADDR` to override the listen address and `RUST_LOG` to tune
//! logging (e.g. `RUST_LOG=gameshow=debug`).

use gameshow::GameshowServer;
use gameshow_questions::StaticBank;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bank = StaticBank::from_json(include_str!("../questions.json"))?;
    tracing::info!(questions = bank.len(), "question bank ready");

    let addr = std::env::var("GAMESHOW_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let server = GameshowServer::builder().bind(&addr).build(bank).await?;

    server.run().await?;
    Ok(())
}
