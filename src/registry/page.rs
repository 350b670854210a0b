use serde::{Deserialize, Serialize};

use crate::graph::value::rc_identity;
use crate::host::ComponentRef;

/// Identifies one mounted root screen. Serialized as `pageInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageDescriptor {
    pub id: String,
    pub route: String,
    pub depth: u32,
}

impl PageDescriptor {
    pub fn new(id: impl Into<String>, route: impl Into<String>, depth: u32) -> Self {
        Self {
            id: id.into(),
            route: route.into(),
            depth,
        }
    }
}

/// A registered page: its descriptor plus the live root component.
#[derive(Clone)]
pub struct PageEntry {
    pub descriptor: PageDescriptor,
    pub component: ComponentRef,
}

impl PageEntry {
    pub fn new(descriptor: PageDescriptor, component: ComponentRef) -> Self {
        Self {
            descriptor,
            component,
        }
    }

    pub fn is(&self, component: &ComponentRef) -> bool {
        rc_identity(&self.component) == rc_identity(component)
    }
}

impl std::fmt::Debug for PageEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageEntry")
            .field("descriptor", &self.descriptor)
            .field("component", &format_args!("@{:#x}", rc_identity(&self.component)))
            .finish()
    }
}
