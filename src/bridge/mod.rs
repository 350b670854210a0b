//! Bridge between a host UI framework and the inspector.
//!
//! [`ObservationHooks`] receives lifecycle callbacks, keeps the
//! [`EntityRegistry`](crate::registry::EntityRegistry) current and turns
//! host activity into [`Envelope`]s on a [`Transport`](crate::transport::Transport).

pub mod envelope;
pub mod error;
pub mod hooks;
pub mod snapshot;

pub use envelope::{
    Envelope, EventPayload, LaunchPayload, Lifecycle, Module, MutationPayload, PagePayload,
    RefreshPagesResponse, StorePayload, Versions, INIT_MUTATION_TYPE, REFRESH_PAGES,
};
pub use error::BridgeError;
pub use hooks::ObservationHooks;
pub use snapshot::{ComponentSnapshot, Snapshotter};
