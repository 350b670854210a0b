//! Adapter interface the host UI framework drives.
//!
//! The host implements [`Component`] and [`Store`] for its own objects and
//! calls the lifecycle handlers on [`crate::bridge::ObservationHooks`]. Nothing
//! here patches host methods at runtime; the host decides where to call in.

pub mod mock;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::graph::LiveValue;
use crate::registry::PageDescriptor;

pub use mock::{MockComponent, MockStore};

/// Shared handle to a live component. Identity is the allocation address.
pub type ComponentRef = Rc<dyn Component>;

/// Shared handle to a live store. Identity is the allocation address.
pub type StoreRef = Rc<dyn Store>;

/// Callback a store invokes synchronously after every committed mutation.
pub type StoreListener = Box<dyn FnMut(&Mutation, &LiveValue)>;

/// What a component instance is in the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    App,
    Page,
    Component,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::App => "app",
            ComponentKind::Page => "page",
            ComponentKind::Component => "component",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live component instance.
pub trait Component {
    /// Registered tag or component name. `None` for anonymous roots.
    fn name(&self) -> Option<String>;

    fn kind(&self) -> ComponentKind;

    /// Descriptor of the page this component is mounted in.
    fn page_info(&self) -> Option<PageDescriptor>;

    fn props(&self) -> LiveValue {
        LiveValue::Null
    }

    fn data(&self) -> LiveValue {
        LiveValue::Null
    }

    fn children(&self) -> Vec<ComponentRef> {
        Vec::new()
    }

    /// State store attached to this component, if any.
    fn store(&self) -> Option<StoreRef> {
        None
    }
}

/// A committed store mutation.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub kind: String,
    pub payload: LiveValue,
}

impl Mutation {
    pub fn new(kind: impl Into<String>, payload: impl Into<LiveValue>) -> Self {
        Self {
            kind: kind.into(),
            payload: payload.into(),
        }
    }
}

/// An external mutable state container with change notification.
pub trait Store {
    fn state(&self) -> LiveValue;

    /// Register `listener` for every future mutation. Called at most once per
    /// store by the bridge.
    fn subscribe(&self, listener: StoreListener);
}

/// Whether an event was emitted by a component or a native element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitterKind {
    Component,
    Element,
}

/// An event dispatched through the host's event system.
#[derive(Clone)]
pub struct HostEvent {
    /// Component instance the event was dispatched on.
    pub emitter: ComponentRef,
    /// Tag of the emitting component or element, when known.
    pub emitter_name: Option<String>,
    pub event_type: String,
    pub payload: LiveValue,
    pub emitter_kind: EmitterKind,
}

impl HostEvent {
    pub fn component(
        emitter: ComponentRef,
        event_type: impl Into<String>,
        payload: impl Into<LiveValue>,
    ) -> Self {
        let emitter_name = emitter.name();
        Self {
            emitter,
            emitter_name,
            event_type: event_type.into(),
            payload: payload.into(),
            emitter_kind: EmitterKind::Component,
        }
    }

    pub fn element(
        emitter: ComponentRef,
        tag: Option<String>,
        event_type: impl Into<String>,
        payload: impl Into<LiveValue>,
    ) -> Self {
        Self {
            emitter,
            emitter_name: tag,
            event_type: event_type.into(),
            payload: payload.into(),
            emitter_kind: EmitterKind::Element,
        }
    }

    /// Display name: the tag when present, else `Root` for components and
    /// `text` for elements.
    pub fn display_name(&self) -> String {
        match (&self.emitter_name, self.emitter_kind) {
            (Some(name), _) if !name.is_empty() => name.clone(),
            (_, EmitterKind::Component) => "Root".to_string(),
            (_, EmitterKind::Element) => "text".to_string(),
        }
    }
}
