//! HTTP surface: `/ws` duplex envelopes, `/chat` server-sent events, and
//! `/health`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures_util::{stream, SinkExt, StreamExt};
use gollama_ai::AiError;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use crate::channel::{DuplexChannel, DEFAULT_OUTBOUND_CAPACITY};
use crate::handler::RequestHandler;
use crate::protocol::{ChatRequest, Envelope, StreamEvent, GENERIC_ERROR};

/// Shared state for every route.
pub struct AppState {
    pub handler: Arc<RequestHandler>,
    pub outbound_capacity: usize,
}

impl AppState {
    pub fn new(handler: Arc<RequestHandler>) -> Self {
        Self {
            handler,
            outbound_capacity: DEFAULT_OUTBOUND_CAPACITY,
        }
    }

    pub fn with_outbound_capacity(mut self, capacity: usize) -> Self {
        self.outbound_capacity = capacity;
        self
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_upgrade))
        .route("/chat", post(chat_stream))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve `router(state)` on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let sessions = state.handler.sessions().count().await;
    Json(serde_json::json!({ "status": "ok", "sessions": sessions }))
}

/// GET /ws
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, peer, state))
}

async fn serve_socket(socket: WebSocket, peer: SocketAddr, state: Arc<AppState>) {
    let (sink, frames) = socket.split();
    let sink = sink.with(|text: String| async move {
        Ok::<_, axum::Error>(WsMessage::Text(text.into()))
    });
    let (channel, drain) = DuplexChannel::spawn(sink, state.outbound_capacity);
    info!(%peer, "Client connected");

    channel.send(&Envelope::greeting());

    let inbound = frames.filter_map(|frame| async move {
        match frame {
            Ok(WsMessage::Text(text)) => Some(Ok(text.to_string())),
            Ok(WsMessage::Binary(data)) => Some(Ok(String::from_utf8_lossy(&data).into_owned())),
            // Pings are answered by axum; a close frame is followed by end of stream.
            Ok(_) => None,
            Err(e) => Some(Err(e)),
        }
    });

    let handler = state.handler.clone();
    channel
        .read_loop(inbound, |envelope| {
            let handler = handler.clone();
            let channel = channel.clone();
            async move { handle_envelope(&handler, &channel, envelope).await }
        })
        .await;

    let _ = drain.await;
    info!(%peer, "Client disconnected");
}

async fn handle_envelope(handler: &RequestHandler, channel: &DuplexChannel, envelope: Envelope) {
    let turn = handler.begin(&envelope.session_id, &envelope.content).await;
    let session_id = turn.session_id.clone();
    let cancel = channel.token();

    let result = handler
        .complete(
            turn,
            |notice| {
                channel.send(&Envelope::processing(&session_id, notice));
            },
            &cancel,
        )
        .await;

    match result {
        Ok(text) => {
            channel.send(&Envelope::response(&session_id, text));
        }
        Err(AiError::Cancelled) => {}
        Err(_) => {
            channel.send(&Envelope::error(&session_id, GENERIC_ERROR));
        }
    }
}

/// POST /chat
async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if request.content.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "content must not be empty" })),
        )
            .into_response();
    }

    let (tx, rx) = mpsc::channel::<StreamEvent>(8);
    let cancel = CancellationToken::new();
    // Dropped with the response stream, which cancels the run when the client goes away.
    let guard = cancel.clone().drop_guard();
    let handler = state.handler.clone();

    tokio::spawn(async move {
        let turn = handler.begin(&request.session_id, &request.content).await;
        let session_id = turn.session_id.clone();
        let _ = tx.try_send(StreamEvent::Info {
            session_id: session_id.clone(),
        });

        let result = handler
            .complete(
                turn,
                |notice| {
                    let _ = tx.try_send(StreamEvent::Update {
                        session_id: session_id.clone(),
                        message: notice.to_string(),
                    });
                },
                &cancel,
            )
            .await;

        let last = match result {
            Ok(response) => StreamEvent::Final {
                session_id,
                response,
            },
            Err(AiError::Cancelled) => {
                debug!(session = %session_id, "Stream closed by client");
                return;
            }
            Err(_) => StreamEvent::Error {
                session_id,
                error: GENERIC_ERROR.to_string(),
            },
        };
        let _ = tx.send(last).await;
    });

    let events = stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let event = rx.recv().await?;
        let sse = Event::default()
            .event(event.name())
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().event("error").data(GENERIC_ERROR));
        Some((Ok::<_, Infallible>(sse), (rx, guard)))
    });

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}
