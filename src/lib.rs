pub mod bridge;
pub mod config;
pub mod graph;
pub mod host;
pub mod inspector;
pub mod registry;
pub mod transport;
pub mod util;

pub use bridge::{BridgeError, Envelope, ObservationHooks, RefreshPagesResponse, Versions};
pub use config::BridgeConfig;
pub use graph::{flatten, GraphFlattener, LiveObject, LiveValue, Sentinel};
pub use host::{Component, ComponentKind, ComponentRef, HostEvent, Store, StoreRef};
pub use registry::{EntityRegistry, PageDescriptor, StoreId};
pub use transport::{MemoryTransport, Transport, TransportError, WebSocketTransport};
