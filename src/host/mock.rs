//! In-memory host objects for deterministic testing and the demo
//!
//! Implements [`Component`] and [`Store`] without a real UI framework. The
//! mock store records how many listeners were attached so tests can verify
//! the bridge subscribes once per store.
//!
//! # Example
//! ```no_run
//! use inspector_bridge::host::{MockComponent, MockStore};
//!
//! let store = MockStore::new().into_ref();
//! let page = MockComponent::page("pages/index/main", "1", 0)
//!     .with_data("count", 0)
//!     .with_store(store.clone())
//!     .into_ref();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::graph::{LiveObject, LiveValue, ObjectRef};
use crate::host::{
    Component, ComponentKind, ComponentRef, Mutation, Store, StoreListener, StoreRef,
};
use crate::registry::PageDescriptor;

/// Mock component instance.
pub struct MockComponent {
    name: Option<String>,
    kind: ComponentKind,
    page: Option<PageDescriptor>,
    props: ObjectRef,
    data: ObjectRef,
    children: Vec<ComponentRef>,
    store: Option<StoreRef>,
}

impl MockComponent {
    /// Page root mounted at `route`.
    pub fn page(route: impl Into<String>, id: impl Into<String>, depth: u32) -> Self {
        Self {
            page: Some(PageDescriptor::new(id, route, depth)),
            ..Self::new(None, ComponentKind::Page)
        }
    }

    /// Nested component rendered inside `page`.
    pub fn component(name: impl Into<String>, page: Option<PageDescriptor>) -> Self {
        Self {
            page,
            ..Self::new(Some(name.into()), ComponentKind::Component)
        }
    }

    /// Application root.
    pub fn app() -> Self {
        Self::new(Some("App".into()), ComponentKind::App)
    }

    fn new(name: Option<String>, kind: ComponentKind) -> Self {
        Self {
            name,
            kind,
            page: None,
            props: LiveObject::new().into_ref(),
            data: LiveObject::new().into_ref(),
            children: Vec::new(),
            store: None,
        }
    }

    pub fn with_prop(self, key: impl Into<String>, value: impl Into<LiveValue>) -> Self {
        self.props.borrow_mut().insert(key, value);
        self
    }

    pub fn with_data(self, key: impl Into<String>, value: impl Into<LiveValue>) -> Self {
        self.data.borrow_mut().insert(key, value);
        self
    }

    pub fn with_child(mut self, child: ComponentRef) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_store(mut self, store: StoreRef) -> Self {
        self.store = Some(store);
        self
    }

    /// Handle to the component's data so tests can mutate it after mounting.
    pub fn data_handle(&self) -> ObjectRef {
        self.data.clone()
    }

    pub fn into_ref(self) -> ComponentRef {
        Rc::new(self)
    }
}

impl Component for MockComponent {
    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn kind(&self) -> ComponentKind {
        self.kind
    }

    fn page_info(&self) -> Option<PageDescriptor> {
        self.page.clone()
    }

    fn props(&self) -> LiveValue {
        LiveValue::Object(self.props.clone())
    }

    fn data(&self) -> LiveValue {
        LiveValue::Object(self.data.clone())
    }

    fn children(&self) -> Vec<ComponentRef> {
        self.children.clone()
    }

    fn store(&self) -> Option<StoreRef> {
        self.store.clone()
    }
}

/// Mock state store.
pub struct MockStore {
    state: ObjectRef,
    listeners: RefCell<Vec<StoreListener>>,
    subscribe_calls: Cell<usize>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            state: LiveObject::new().into_ref(),
            listeners: RefCell::new(Vec::new()),
            subscribe_calls: Cell::new(0),
        }
    }

    pub fn with_state(self, key: impl Into<String>, value: impl Into<LiveValue>) -> Self {
        self.state.borrow_mut().insert(key, value);
        self
    }

    pub fn state_handle(&self) -> ObjectRef {
        self.state.clone()
    }

    /// Set `key` to `value` and notify every listener with a mutation of
    /// type `kind` carrying `value` as payload.
    pub fn commit(&self, kind: &str, key: &str, value: impl Into<LiveValue>) {
        let value = value.into();
        self.state.borrow_mut().insert(key, value.clone());

        let mutation = Mutation::new(kind, value);
        let state = LiveValue::Object(self.state.clone());
        for listener in self.listeners.borrow_mut().iter_mut() {
            listener(&mutation, &state);
        }
    }

    /// Number of times `subscribe` was called.
    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.get()
    }

    pub fn into_ref(self) -> Rc<MockStore> {
        Rc::new(self)
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MockStore {
    fn state(&self) -> LiveValue {
        LiveValue::Object(self.state.clone())
    }

    fn subscribe(&self, listener: StoreListener) {
        self.subscribe_calls.set(self.subscribe_calls.get() + 1);
        self.listeners.borrow_mut().push(listener);
    }
}
