//! The channel hub: per-connection plumbing between sockets and sessions.
//!
//! Each accepted WebSocket gets a connection id, a reader loop (this
//! function), and a writer task. Everything the connection is owed — acks
//! for its own requests and room broadcasts alike — flows through one
//! unbounded outbound queue, so per-connection ordering is the queue
//! order: state mutates first, then the resulting messages go out.
//!
//! Requests split three ways here:
//! - room membership (`createRoom` / `joinRoom`) goes to the registry,
//! - `getQuestions` goes straight to the question bank,
//! - everything else is routed into the caller's session actor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use gameshow_protocol::{
    Ack, AckData, ClientRequest, Codec, ConnectionId, FailureReason, ServerMessage,
};
use gameshow_session::OutboundSender;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::ServerError;
use crate::server::HubState;

/// Counter for generating unique connection ids.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Handles one connection from accept to close.
pub(crate) async fn handle_connection(
    ws: WebSocketStream<TcpStream>,
    state: Arc<HubState>,
) -> Result<(), ServerError> {
    let conn = ConnectionId(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
    tracing::debug!(%conn, "connection open");

    let (mut sink, mut stream) = ws.split();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerMessage>();

    // Writer task: drains the outbound queue into the socket. Ends when
    // every sender (this handler plus any session actor) is gone, or the
    // peer stops reading.
    let codec = state.codec;
    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let Ok(bytes) = codec.encode(&msg) else { continue };
            let Ok(text) = String::from_utf8(bytes) else { continue };
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    // Reader loop: decode a request, route it, queue the ack.
    while let Some(frame) = stream.next().await {
        let data: Vec<u8> = match frame {
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Binary(data)) => data.into(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // ping/pong/frame
            Err(e) => {
                tracing::debug!(%conn, error = %e, "socket error");
                break;
            }
        };

        let request: ClientRequest = match state.codec.decode(&data) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(%conn, error = %e, "undecodable request, dropping");
                continue;
            }
        };

        let ack = route_request(conn, request, &state, &out_tx).await;
        let _ = out_tx.send(ServerMessage::Ack(ack));
    }

    // The registry decides what the departure means: a host tears its
    // room down, a player is removed from its roster.
    state.registry.lock().await.disconnect(conn).await;
    tracing::debug!(%conn, "connection closed");

    writer.abort();
    Ok(())
}

/// Routes one request to the registry, the bank, or the caller's session.
async fn route_request(
    conn: ConnectionId,
    request: ClientRequest,
    state: &Arc<HubState>,
    out_tx: &OutboundSender,
) -> Ack {
    match request {
        ClientRequest::CreateRoom => {
            let room = state.registry.lock().await.create_session(conn, out_tx.clone());
            Ack::ok_with(AckData::Room { room })
        }

        ClientRequest::JoinRoom { room, name, role } => {
            state
                .registry
                .lock()
                .await
                .join_session(&room, conn, name, role, out_tx.clone())
                .await
        }

        ClientRequest::GetQuestions { round_type, count } => {
            match state.bank.draw(round_type, count) {
                Ok(questions) => Ack::ok_with(AckData::Questions { questions }),
                Err(e) => {
                    tracing::debug!(%conn, error = %e, "question draw failed");
                    Ack::fail(FailureReason::QuestionBankUnavailable)
                }
            }
        }

        // PERF: the registry lock is held across the actor round-trip.
        // One party-sized room per process neighborhood makes that fine;
        // cache the handle per connection if it ever is not.
        other => state.registry.lock().await.act(conn, other).await,
    }
}
