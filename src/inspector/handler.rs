//! WebSocket handler for one connected bridge.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};

use super::server::InspectorState;
use crate::bridge::REFRESH_PAGES;
use crate::transport::{InboundFrame, OutboundFrame};

/// Serve one bridge connection until it closes.
///
/// A `refreshPages` request is sent as soon as the bridge connects so the
/// inspector starts from a full snapshot.
pub async fn handle_bridge_socket(socket: WebSocket, state: InspectorState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Channel for sending frames to the WebSocket
    let (tx, mut rx) = mpsc::channel::<InboundFrame>(256);

    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let json = match serde_json::to_string(&frame) {
                Ok(j) => j,
                Err(e) => {
                    tracing::error!("Failed to serialize frame: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // Forward inspector-initiated requests to this bridge.
    let mut commands = state.commands();
    let command_tx = tx.clone();
    let command_task = tokio::spawn(async move {
        loop {
            match commands.recv().await {
                Ok(frame) => {
                    if command_tx.send(frame).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Bridge connection lagged behind inspector requests");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tracing::info!("Bridge connected");
    let initial = InboundFrame::request(state.next_request_id(), REFRESH_PAGES);
    if let Err(send_err) = tx.send(initial).await {
        tracing::debug!(error = ?send_err, "Failed to send initial refresh request");
    }

    while let Some(result) = ws_receiver.next().await {
        let text = match result {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
        };

        match serde_json::from_str::<OutboundFrame>(text.as_str()) {
            Ok(OutboundFrame::Pong) => {
                tracing::trace!("Pong from bridge");
            }
            Ok(frame) => state.publish(frame),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed bridge frame");
            }
        }
    }

    tracing::info!("Bridge disconnected");
    command_task.abort();
    send_task.abort();
}
