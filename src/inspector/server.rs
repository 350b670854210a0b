//! Axum server accepting bridge connections.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use super::handler::handle_bridge_socket;
use crate::transport::{InboundFrame, OutboundFrame};

/// Server configuration options.
#[derive(Debug, Clone)]
pub struct InspectorConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9229,
        }
    }
}

const CHANNEL_CAPACITY: usize = 1024;

/// Shared state for the inspector endpoint.
///
/// Frames received from any bridge are broadcast to every
/// [`subscribe`](Self::subscribe) receiver. Requests sent through
/// [`request`](Self::request) go to every connected bridge.
#[derive(Clone)]
pub struct InspectorState {
    frames: broadcast::Sender<OutboundFrame>,
    commands: broadcast::Sender<InboundFrame>,
    next_request_id: Arc<AtomicU64>,
}

impl InspectorState {
    pub fn new() -> Self {
        let (frames, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (commands, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            frames,
            commands,
            next_request_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Receive every frame sent by connected bridges from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<OutboundFrame> {
        self.frames.subscribe()
    }

    /// Send a request to all connected bridges. Returns the request id and
    /// the number of bridges it reached.
    pub fn request(&self, event: &str) -> (u64, usize) {
        let id = self.next_request_id();
        let reached = self
            .commands
            .send(InboundFrame::request(id, event))
            .unwrap_or(0);
        (id, reached)
    }

    pub fn connection_count(&self) -> usize {
        self.commands.receiver_count()
    }

    pub(super) fn next_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(super) fn commands(&self) -> broadcast::Receiver<InboundFrame> {
        self.commands.subscribe()
    }

    pub(super) fn publish(&self, frame: OutboundFrame) {
        if self.frames.send(frame).is_err() {
            tracing::trace!("No frame subscribers");
        }
    }
}

impl Default for InspectorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    connections: usize,
}

/// Health check endpoint handler.
async fn health(State(state): State<InspectorState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        connections: state.connection_count(),
    })
}

#[derive(Serialize)]
struct RequestResponse {
    id: u64,
    event: String,
    reached: usize,
}

/// Forward a request (e.g. `refreshPages`) to every connected bridge.
async fn send_request(
    Path(event): Path<String>,
    State(state): State<InspectorState>,
) -> impl IntoResponse {
    let (id, reached) = state.request(&event);
    let status = if reached == 0 {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::ACCEPTED
    };
    (status, Json(RequestResponse { id, event, reached }))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<InspectorState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_bridge_socket(socket, state))
}

/// Build the Axum router with all routes.
pub fn build_router(state: InspectorState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bridge", get(ws_handler))
        .route("/api/request/{event}", post(send_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the inspector endpoint on an already bound listener.
pub async fn serve(listener: TcpListener, state: InspectorState) -> anyhow::Result<()> {
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

/// Run the inspector endpoint.
///
/// This binds the configured address and blocks until shutdown.
pub async fn run_server(state: InspectorState, config: InspectorConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Inspector listening at ws://{}/bridge", addr);
    serve(listener, state).await
}
