//! Lifecycle and event handlers the host framework calls into.
//!
//! Every public handler is infallible from the host's point of view: failures
//! are logged and the affected envelope is skipped.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};

use crate::bridge::envelope::{
    Envelope, EventPayload, LaunchPayload, Lifecycle, MutationPayload, PagePayload,
    RefreshPagesResponse, StorePayload, Versions, REFRESH_PAGES,
};
use crate::bridge::snapshot::Snapshotter;
use crate::bridge::BridgeError;
use crate::config::BridgeConfig;
use crate::graph::{GraphFlattener, LiveValue};
use crate::host::{ComponentKind, ComponentRef, HostEvent, Mutation, StoreListener};
use crate::registry::{EntityRegistry, PageDescriptor, PageEntry, StoreId};
use crate::transport::{InboundRequest, Transport};

/// Glue between host lifecycle callbacks, the registry and the transport.
pub struct ObservationHooks {
    registry: Rc<RefCell<EntityRegistry>>,
    transport: Arc<dyn Transport>,
    versions: Versions,
    event_flattener: GraphFlattener,
    snapshotter: Snapshotter,
    requests: RefCell<Option<UnboundedReceiver<InboundRequest>>>,
}

impl ObservationHooks {
    pub fn new(config: &BridgeConfig, transport: Arc<dyn Transport>, versions: Versions) -> Self {
        Self {
            registry: Rc::new(RefCell::new(EntityRegistry::new())),
            transport,
            versions,
            event_flattener: config.events.flattener(),
            snapshotter: config.snapshot.snapshotter(),
            requests: RefCell::new(None),
        }
    }

    /// Read access to the registry, for diagnostics and tests.
    pub fn registry(&self) -> Ref<'_, EntityRegistry> {
        self.registry.borrow()
    }

    pub fn versions(&self) -> &Versions {
        &self.versions
    }

    /// Application launched.
    pub fn launch(&self) {
        let result = Envelope::component(
            Lifecycle::Launch,
            ComponentKind::App.as_str(),
            &LaunchPayload {
                versions: self.versions.clone(),
            },
        );
        self.finish("launch", result.map(|envelope| self.send(envelope)));
    }

    /// A new page or component instance started loading.
    pub fn load(&self, component: &ComponentRef) {
        let result = Envelope::component(
            Lifecycle::Load,
            component.kind().as_str(),
            &serde_json::Map::new(),
        );
        self.finish("load", result.map(|envelope| self.send(envelope)));
    }

    /// A component finished mounting. Only page roots are tracked.
    pub fn mounted(&self, component: &ComponentRef) {
        let result = self.try_mounted(component);
        self.finish("mounted", result);
    }

    /// A component re-rendered. Only registered page roots are reported.
    pub fn updated(&self, component: &ComponentRef) {
        let result = self.try_updated(component);
        self.finish("updated", result);
    }

    /// A component is about to be destroyed. Only page roots are tracked.
    pub fn before_destroy(&self, component: &ComponentRef) {
        let result = self.try_before_destroy(component);
        self.finish("before_destroy", result);
    }

    /// An event went through the host's event system.
    pub fn event(&self, event: &HostEvent) {
        let result = self.try_event(event);
        self.finish("event", result);
    }

    /// Current pages with fresh snapshots plus one entry per distinct store.
    pub fn refresh_pages(&self) -> Result<RefreshPagesResponse, BridgeError> {
        let registry = self.registry_ref()?;
        let timestamp = chrono::Utc::now().timestamp_millis();
        let state_flattener = self.snapshotter.flattener();

        let pages = registry
            .pages()
            .map(|entry| PagePayload {
                page_info: entry
                    .component
                    .page_info()
                    .unwrap_or_else(|| entry.descriptor.clone()),
                component: self.snapshotter.snapshot(&entry.component),
            })
            .collect();

        let stores = registry
            .mounted_stores()
            .into_iter()
            .map(|record| StorePayload {
                store_id: record.store_id(),
                mutation: MutationPayload::init(),
                state: state_flattener.flatten(&record.store().state()),
                subscribed_pages: record.subscribed_pages().to_vec(),
                timestamp: Some(timestamp),
            })
            .collect();

        Ok(RefreshPagesResponse {
            versions: self.versions.clone(),
            pages,
            stores,
        })
    }

    /// Register for `refreshPages` requests on the transport. Requests are
    /// queued until [`process_requests`](Self::process_requests) runs on the
    /// host thread.
    pub fn listen(&self) -> Result<(), BridgeError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.transport.on(
            REFRESH_PAGES,
            Box::new(move |request| {
                if tx.send(request).is_err() {
                    tracing::debug!("Bridge dropped; ignoring inspector request");
                }
            }),
        )?;
        *self.requests.borrow_mut() = Some(rx);
        Ok(())
    }

    /// Answer every queued inspector request. Returns how many were answered.
    pub fn process_requests(&self) -> usize {
        let mut requests = self.requests.borrow_mut();
        let Some(rx) = requests.as_mut() else {
            return 0;
        };

        let mut answered = 0;
        while let Ok(request) = rx.try_recv() {
            if request.event != REFRESH_PAGES {
                tracing::debug!(event = %request.event, "Ignoring unsupported inspector request");
                continue;
            }
            let reply = self
                .refresh_pages()
                .and_then(|response| Ok(serde_json::to_value(&response)?));
            match reply {
                Ok(data) => {
                    request.respond(data);
                    answered += 1;
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Failed to build refreshPages reply");
                }
            }
        }
        answered
    }

    fn try_mounted(&self, component: &ComponentRef) -> Result<(), BridgeError> {
        if component.kind() != ComponentKind::Page {
            return Ok(());
        }
        let page_info = component.page_info().ok_or(BridgeError::MissingPageInfo)?;
        let snapshot = self.snapshotter.snapshot(component);

        self.registry_mut()?
            .register_page(PageEntry::new(page_info.clone(), component.clone()));

        self.send(Envelope::component(
            Lifecycle::Mounted,
            ComponentKind::Page.as_str(),
            &PagePayload {
                page_info: page_info.clone(),
                component: snapshot,
            },
        )?);

        self.observe_store(component, page_info)
    }

    /// Record the page's store usage and, for the first page to see the
    /// store, attach the change listener and send the baseline.
    fn observe_store(
        &self,
        component: &ComponentRef,
        page_info: PageDescriptor,
    ) -> Result<(), BridgeError> {
        let Some(store) = component.store() else {
            return Ok(());
        };

        let (store_id, claimed, subscribed_pages) = {
            let mut registry = self.registry_mut()?;
            let record = registry.resolve_store(&store);
            record.record_page(page_info);
            (
                record.store_id(),
                record.mark_subscribed(),
                record.subscribed_pages().to_vec(),
            )
        };
        if !claimed {
            return Ok(());
        }

        let baseline = StorePayload {
            store_id,
            mutation: MutationPayload::init(),
            state: self.snapshotter.flattener().flatten(&store.state()),
            subscribed_pages,
            timestamp: None,
        };
        self.send(Envelope::store(&baseline)?);

        store.subscribe(self.store_listener(store_id));
        tracing::debug!(store_id, "Subscribed to store changes");
        Ok(())
    }

    fn store_listener(&self, store_id: StoreId) -> StoreListener {
        let registry = Rc::downgrade(&self.registry);
        let transport = self.transport.clone();
        let flattener = self.snapshotter.flattener().clone();

        Box::new(move |mutation: &Mutation, state: &LiveValue| {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            let subscribed_pages = match registry.try_borrow() {
                Ok(registry) => registry
                    .store(store_id)
                    .map(|record| record.subscribed_pages().to_vec())
                    .unwrap_or_default(),
                Err(_) => {
                    tracing::warn!(
                        store_id,
                        mutation = %mutation.kind,
                        "Store notified during registry update; dropping mutation"
                    );
                    return;
                }
            };

            let payload = StorePayload {
                store_id,
                mutation: MutationPayload {
                    kind: mutation.kind.clone(),
                    payload: Some(flattener.flatten(&mutation.payload)),
                },
                state: flattener.flatten(state),
                subscribed_pages,
                timestamp: None,
            };
            match Envelope::store(&payload) {
                Ok(envelope) => send_envelope(transport.as_ref(), envelope),
                Err(error) => {
                    tracing::warn!(store_id, error = %error, "Failed to encode store mutation");
                }
            }
        })
    }

    fn try_updated(&self, component: &ComponentRef) -> Result<(), BridgeError> {
        let registered = self
            .registry_ref()?
            .find_page(component)
            .map(|entry| entry.descriptor.clone());
        let Some(registered) = registered else {
            tracing::trace!("Update on a component that is not a registered page");
            return Ok(());
        };

        let page_info = component.page_info().unwrap_or(registered);
        self.send(Envelope::component(
            Lifecycle::Updated,
            ComponentKind::Component.as_str(),
            &PagePayload {
                page_info,
                component: self.snapshotter.snapshot(component),
            },
        )?);
        Ok(())
    }

    fn try_before_destroy(&self, component: &ComponentRef) -> Result<(), BridgeError> {
        if component.kind() != ComponentKind::Page {
            return Ok(());
        }

        let removed = self.registry_mut()?.unregister_page(component);
        let page_info = component
            .page_info()
            .or_else(|| removed.map(|entry| entry.descriptor))
            .ok_or(BridgeError::MissingPageInfo)?;

        self.send(Envelope::component(
            Lifecycle::BeforeDestroy,
            ComponentKind::Page.as_str(),
            &PagePayload {
                page_info,
                component: self.snapshotter.snapshot(component),
            },
        )?);
        Ok(())
    }

    fn try_event(&self, event: &HostEvent) -> Result<(), BridgeError> {
        let page_info = event
            .emitter
            .page_info()
            .ok_or(BridgeError::MissingPageInfo)?;

        let payload = EventPayload {
            emitter_name: event.display_name(),
            page_info,
            event_type: event.event_type.clone(),
            event: self.event_flattener.flatten(&event.payload),
            emitter_type: event.emitter_kind,
        };
        self.send(Envelope::event(&payload)?);
        Ok(())
    }

    fn registry_ref(&self) -> Result<Ref<'_, EntityRegistry>, BridgeError> {
        self.registry
            .try_borrow()
            .map_err(|_| BridgeError::RegistryBusy)
    }

    fn registry_mut(&self) -> Result<RefMut<'_, EntityRegistry>, BridgeError> {
        self.registry
            .try_borrow_mut()
            .map_err(|_| BridgeError::RegistryBusy)
    }

    fn send(&self, envelope: Envelope) {
        send_envelope(self.transport.as_ref(), envelope);
    }

    fn finish(&self, hook: &'static str, result: Result<(), BridgeError>) {
        match result {
            Ok(()) => {}
            Err(BridgeError::MissingPageInfo) => {
                tracing::debug!(hook, "Host component has no page info; envelope skipped");
            }
            Err(error) => {
                tracing::warn!(hook, error = %error, "Observation hook failed; envelope skipped");
            }
        }
    }
}

/// Fire-and-forget delivery. Undeliverable envelopes are dropped.
fn send_envelope(transport: &dyn Transport, envelope: Envelope) {
    let module = envelope.module;
    if let Err(error) = transport.emit(envelope) {
        tracing::debug!(?module, error = %error, "Dropped envelope");
    }
}
