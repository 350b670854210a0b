//! Fixtures for driving the bridge with the mock host

use std::rc::Rc;
use std::sync::Arc;

use inspector_bridge::bridge::{Envelope, Module};
use inspector_bridge::config::BridgeConfig;
use inspector_bridge::graph::{LiveValue, ObjectRef};
use inspector_bridge::host::{ComponentRef, MockComponent, MockStore, StoreRef};
use inspector_bridge::registry::PageDescriptor;
use inspector_bridge::{MemoryTransport, ObservationHooks, Versions};

pub const INDEX_ROUTE: &str = "pages/index/main";
pub const DETAIL_ROUTE: &str = "pages/detail/main";

/// Hooks wired to a recording transport.
pub fn bridge() -> (ObservationHooks, MemoryTransport) {
    bridge_with(BridgeConfig::default())
}

pub fn bridge_with(config: BridgeConfig) -> (ObservationHooks, MemoryTransport) {
    let transport = MemoryTransport::new();
    let hooks = ObservationHooks::new(
        &config,
        Arc::new(transport.clone()),
        Versions::new().with("host", "test"),
    );
    (hooks, transport)
}

/// Two pages sharing one store, plus a child component on the index page.
pub struct MockApp {
    pub store: Rc<MockStore>,
    pub index: ComponentRef,
    pub index_data: ObjectRef,
    pub detail: ComponentRef,
    pub button: ComponentRef,
}

impl MockApp {
    pub fn new() -> Self {
        let store = MockStore::new()
            .with_state("count", 0)
            .with_state("user", LiveValue::object([("name", "guest")]))
            .into_ref();
        let shared: StoreRef = store.clone();

        let button = MockComponent::component("button", Some(index_page()))
            .with_prop("label", "+1")
            .into_ref();
        let index = MockComponent::page(INDEX_ROUTE, "1", 0)
            .with_data("title", "Home")
            .with_child(button.clone())
            .with_store(shared.clone());
        let index_data = index.data_handle();

        let detail = MockComponent::page(DETAIL_ROUTE, "2", 1)
            .with_data("id", 42)
            .with_store(shared)
            .into_ref();

        Self {
            store,
            index: index.into_ref(),
            index_data,
            detail,
            button,
        }
    }
}

pub fn index_page() -> PageDescriptor {
    PageDescriptor::new("1", INDEX_ROUTE, 0)
}

pub fn detail_page() -> PageDescriptor {
    PageDescriptor::new("2", DETAIL_ROUTE, 1)
}

pub fn of_module(envelopes: &[Envelope], module: Module) -> Vec<Envelope> {
    envelopes
        .iter()
        .filter(|envelope| envelope.module == module)
        .cloned()
        .collect()
}
