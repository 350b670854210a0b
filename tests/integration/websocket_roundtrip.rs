//! Bridge ↔ inspector over a real WebSocket

use std::sync::Arc;
use std::time::Duration;

use inspector_bridge::bridge::{Lifecycle, Module, REFRESH_PAGES};
use inspector_bridge::config::BridgeConfig;
use inspector_bridge::inspector::{serve, InspectorState};
use inspector_bridge::transport::OutboundFrame;
use inspector_bridge::{ObservationHooks, Versions, WebSocketTransport};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use super::common::fixtures::{MockApp, INDEX_ROUTE};

async fn start_inspector() -> (InspectorState, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = InspectorState::new();
    tokio::spawn(serve(listener, state.clone()));
    (state, format!("ws://{}/bridge", addr))
}

/// Pump queued requests and wait for the first frame matching `pred`.
async fn wait_for<F>(
    hooks: &ObservationHooks,
    frames: &mut broadcast::Receiver<OutboundFrame>,
    mut pred: F,
) -> OutboundFrame
where
    F: FnMut(&OutboundFrame) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            hooks.process_requests();
            match tokio::time::timeout(Duration::from_millis(20), frames.recv()).await {
                Ok(Ok(frame)) if pred(&frame) => return frame,
                Ok(Ok(_)) | Err(_) => continue,
                Ok(Err(e)) => panic!("frame stream ended: {e}"),
            }
        }
    })
    .await
    .expect("timed out waiting for frame")
}

fn bridge_to(url: &str) -> ObservationHooks {
    let config = BridgeConfig::default().with_inspector_url(url);
    let transport = Arc::new(WebSocketTransport::new(
        config.inspector_url.clone(),
        Duration::from_millis(50),
    ));
    ObservationHooks::new(&config, transport, Versions::new().with("host", "test"))
}

#[tokio::test]
async fn bridge_streams_envelopes_and_answers_refresh() {
    let (state, url) = start_inspector().await;
    let mut frames = state.subscribe();

    let hooks = bridge_to(&url);
    hooks.listen().unwrap();
    let app = MockApp::new();
    hooks.launch();
    hooks.mounted(&app.index);

    let mounted = wait_for(&hooks, &mut frames, |frame| {
        matches!(frame, OutboundFrame::Envelope { envelope } if envelope.lifecycle == Some(Lifecycle::Mounted))
    })
    .await;
    let OutboundFrame::Envelope { envelope } = mounted else {
        unreachable!()
    };
    assert_eq!(envelope.data["pageInfo"]["route"], json!(INDEX_ROUTE));

    // The inspector asks for a full snapshot as soon as the bridge connects.
    let reply = wait_for(&hooks, &mut frames, |frame| {
        matches!(frame, OutboundFrame::Reply { .. })
    })
    .await;
    let OutboundFrame::Reply { event, data, .. } = reply else {
        unreachable!()
    };
    assert_eq!(event, REFRESH_PAGES);
    assert_eq!(data["pages"][0]["pageInfo"]["route"], json!(INDEX_ROUTE));
    assert_eq!(data["stores"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn inspector_initiated_request_is_answered_with_its_id() {
    let (state, url) = start_inspector().await;
    let mut frames = state.subscribe();

    let hooks = bridge_to(&url);
    hooks.listen().unwrap();
    let app = MockApp::new();
    hooks.mounted(&app.index);

    // Wait for the connect-time reply so the bridge is known to be connected.
    wait_for(&hooks, &mut frames, |frame| {
        matches!(frame, OutboundFrame::Reply { .. })
    })
    .await;

    let (id, reached) = state.request(REFRESH_PAGES);
    assert_eq!(reached, 1);

    let reply = wait_for(&hooks, &mut frames, |frame| {
        matches!(frame, OutboundFrame::Reply { id: reply_id, .. } if *reply_id == id)
    })
    .await;
    assert!(matches!(reply, OutboundFrame::Reply { event, .. } if event == REFRESH_PAGES));
}

#[tokio::test]
async fn store_mutations_reach_the_inspector() {
    let (state, url) = start_inspector().await;
    let mut frames = state.subscribe();

    let hooks = bridge_to(&url);
    let app = MockApp::new();
    hooks.mounted(&app.index);
    app.store.commit("increment", "count", 3);

    let mutation = wait_for(&hooks, &mut frames, |frame| {
        matches!(
            frame,
            OutboundFrame::Envelope { envelope }
                if envelope.module == Module::Vuex && envelope.data["mutation"]["type"] == "increment"
        )
    })
    .await;
    let OutboundFrame::Envelope { envelope } = mutation else {
        unreachable!()
    };
    assert_eq!(envelope.data["state"]["count"], json!(3));
    assert_eq!(envelope.data["mutation"]["payload"], json!(3));
}
