//! End-to-end lifecycle flows over the in-memory transport

use inspector_bridge::bridge::{Lifecycle, Module, INIT_MUTATION_TYPE, REFRESH_PAGES};
use inspector_bridge::graph::{LiveValue, Sentinel};
use inspector_bridge::host::HostEvent;
use serde_json::json;

use super::common::fixtures::{bridge, detail_page, index_page, of_module, MockApp, INDEX_ROUTE};

#[test]
fn full_session_produces_expected_envelope_sequence() {
    let (hooks, transport) = bridge();
    let app = MockApp::new();

    hooks.launch();
    hooks.load(&app.index);
    hooks.mounted(&app.index);
    hooks.load(&app.detail);
    hooks.mounted(&app.detail);
    hooks.before_destroy(&app.detail);

    let sequence: Vec<_> = transport
        .envelopes()
        .iter()
        .map(|e| (e.module, e.lifecycle, e.kind.clone()))
        .collect();
    assert_eq!(
        sequence,
        vec![
            (Module::Components, Some(Lifecycle::Launch), Some("app".into())),
            (Module::Components, Some(Lifecycle::Load), Some("page".into())),
            (Module::Components, Some(Lifecycle::Mounted), Some("page".into())),
            (Module::Vuex, None, None),
            (Module::Components, Some(Lifecycle::Load), Some("page".into())),
            (Module::Components, Some(Lifecycle::Mounted), Some("page".into())),
            (Module::Components, Some(Lifecycle::BeforeDestroy), Some("page".into())),
        ]
    );
}

#[test]
fn shared_store_is_subscribed_once_and_tracks_every_page() {
    let (hooks, transport) = bridge();
    let app = MockApp::new();

    hooks.mounted(&app.index);
    hooks.mounted(&app.detail);

    assert_eq!(app.store.subscribe_calls(), 1);
    assert_eq!(hooks.registry().store_count(), 1);

    let baselines = of_module(&transport.take_envelopes(), Module::Vuex);
    assert_eq!(baselines.len(), 1);
    assert_eq!(baselines[0].data["mutation"]["type"], json!(INIT_MUTATION_TYPE));
    assert_eq!(baselines[0].data["subscribedPages"], json!([index_page()]));

    app.store.commit("increment", "count", 1);

    let mutations = of_module(&transport.envelopes(), Module::Vuex);
    assert_eq!(mutations.len(), 1);
    assert_eq!(
        mutations[0].data["subscribedPages"],
        json!([index_page(), detail_page()])
    );
    assert_eq!(mutations[0].data["state"]["count"], json!(1));
    assert_eq!(mutations[0].data["state"]["user"], json!({"name": "guest"}));
}

#[test]
fn unmounting_keeps_store_bookkeeping() {
    let (hooks, transport) = bridge();
    let app = MockApp::new();

    hooks.mounted(&app.index);
    hooks.mounted(&app.detail);
    hooks.before_destroy(&app.index);
    hooks.before_destroy(&app.detail);

    assert_eq!(hooks.registry().page_count(), 0);
    assert_eq!(hooks.registry().store_count(), 1);
    transport.take_envelopes();

    // Mutations keep flowing even with no page mounted.
    app.store.commit("reset", "count", 0);
    let mutations = of_module(&transport.envelopes(), Module::Vuex);
    assert_eq!(mutations.len(), 1);
    assert_eq!(mutations[0].data["subscribedPages"].as_array().unwrap().len(), 2);

    // Remounting does not subscribe again.
    hooks.mounted(&app.index);
    assert_eq!(app.store.subscribe_calls(), 1);
}

#[test]
fn refresh_reply_lists_pages_newest_first_and_stores_once() {
    let (hooks, transport) = bridge();
    let app = MockApp::new();
    hooks.listen().unwrap();
    hooks.mounted(&app.index);
    hooks.mounted(&app.detail);

    transport.dispatch(REFRESH_PAGES);
    assert_eq!(hooks.process_requests(), 1);

    let replies = transport.replies();
    assert_eq!(replies.len(), 1);
    let reply = &replies[0].1;

    let routes: Vec<_> = reply["pages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["pageInfo"]["route"].clone())
        .collect();
    assert_eq!(routes, vec![json!("pages/detail/main"), json!(INDEX_ROUTE)]);

    let stores = reply["stores"].as_array().unwrap();
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0]["storeId"], json!(0));
    assert_eq!(stores[0]["mutation"], json!({"type": INIT_MUTATION_TYPE}));
    assert!(stores[0]["timestamp"].is_i64());
    assert_eq!(reply["versions"]["host"], json!("test"));

    let index = &reply["pages"][1]["component"];
    assert_eq!(index["data"], json!({"title": "Home"}));
    assert_eq!(index["children"][0]["name"], json!("button"));
    assert_eq!(index["children"][0]["props"], json!({"label": "+1"}));
}

#[test]
fn updated_snapshot_reflects_current_data() {
    let (hooks, transport) = bridge();
    let app = MockApp::new();
    hooks.mounted(&app.index);
    transport.take_envelopes();

    app.index_data.borrow_mut().insert("title", "Changed");
    hooks.updated(&app.index);
    hooks.updated(&app.button);

    let envelopes = transport.envelopes();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].lifecycle, Some(Lifecycle::Updated));
    assert_eq!(envelopes[0].data["component"]["data"]["title"], json!("Changed"));
}

#[test]
fn cyclic_state_is_decycled_in_snapshots() {
    let (hooks, transport) = bridge();
    let app = MockApp::new();
    app.index_data
        .borrow_mut()
        .insert("self", LiveValue::Object(app.index_data.clone()));
    app.index_data
        .borrow_mut()
        .insert("$parent", LiveValue::object([("x", 1)]));

    hooks.mounted(&app.index);

    let data = &transport.envelopes()[0].data["component"]["data"];
    assert_eq!(
        data["self"],
        Sentinel::Circular { path: "~".into() }.into_value()
    );
    assert_eq!(data["$parent"], Sentinel::Excluded.into_value());
}

#[test]
fn events_carry_emitter_and_page() {
    let (hooks, transport) = bridge();
    let app = MockApp::new();

    hooks.event(&HostEvent::component(
        app.button.clone(),
        "increment",
        LiveValue::object([("by", 1)]),
    ));
    hooks.event(&HostEvent::element(
        app.index.clone(),
        None,
        "tap",
        LiveValue::Null,
    ));

    let events = of_module(&transport.envelopes(), Module::Events);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].data["emitterName"], json!("button"));
    assert_eq!(events[0].data["emitterType"], json!("component"));
    assert_eq!(events[0].data["pageInfo"], json!(index_page()));
    assert_eq!(events[0].data["event"], json!({"by": 1}));
    assert_eq!(events[1].data["emitterName"], json!("text"));
    assert_eq!(events[1].data["event"], json!(null));
}

#[test]
fn offline_transport_loses_envelopes_but_not_state() {
    let (hooks, transport) = bridge();
    let app = MockApp::new();

    transport.set_offline(true);
    hooks.launch();
    hooks.mounted(&app.index);
    hooks.mounted(&app.detail);
    assert!(transport.envelopes().is_empty());

    transport.set_offline(false);
    app.store.commit("increment", "count", 5);

    let envelopes = transport.envelopes();
    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].data["state"]["count"], json!(5));
    assert_eq!(hooks.registry().page_count(), 2);
    assert_eq!(transport.connection_count(), 1);
}
