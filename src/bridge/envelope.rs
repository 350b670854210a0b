//! Wire envelopes and their module-specific payloads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::snapshot::ComponentSnapshot;
use crate::bridge::BridgeError;
use crate::host::EmitterKind;
use crate::registry::{PageDescriptor, StoreId};

/// Mutation type of the synthetic baseline sent when a store is first seen.
pub const INIT_MUTATION_TYPE: &str = "__devtool__:init";

/// Inbound request asking for a full snapshot.
pub const REFRESH_PAGES: &str = "refreshPages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Module {
    Components,
    Events,
    Vuex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Lifecycle {
    Launch,
    Load,
    Mounted,
    Updated,
    BeforeDestroy,
}

/// Unit of telemetry sent to the inspector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub module: Module,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<Lifecycle>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub data: Value,
}

impl Envelope {
    pub fn new(module: Module, data: Value) -> Self {
        Self {
            module,
            lifecycle: None,
            kind: None,
            data,
        }
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// `components` envelope for a lifecycle step.
    pub fn component<T: Serialize>(
        lifecycle: Lifecycle,
        kind: impl Into<String>,
        payload: &T,
    ) -> Result<Self, BridgeError> {
        Ok(Self::new(Module::Components, serde_json::to_value(payload)?)
            .with_lifecycle(lifecycle)
            .with_kind(kind))
    }

    pub fn event(payload: &EventPayload) -> Result<Self, BridgeError> {
        Ok(Self::new(Module::Events, serde_json::to_value(payload)?))
    }

    pub fn store(payload: &StorePayload) -> Result<Self, BridgeError> {
        Ok(Self::new(Module::Vuex, serde_json::to_value(payload)?))
    }
}

/// Name → version metadata reported on launch and in refresh replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Versions(BTreeMap<String, String>);

impl Versions {
    /// Only the bridge's own version.
    pub fn new() -> Self {
        let mut map = BTreeMap::new();
        map.insert("bridge".to_string(), env!("CARGO_PKG_VERSION").to_string());
        Self(map)
    }

    pub fn with(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.0.insert(name.into(), version.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

impl Default for Versions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchPayload {
    pub versions: Versions,
}

/// `{pageInfo, component}` carried by page lifecycle envelopes and refresh replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePayload {
    pub page_info: PageDescriptor,
    pub component: ComponentSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub emitter_name: String,
    pub page_info: PageDescriptor,
    #[serde(rename = "type")]
    pub event_type: String,
    pub event: Value,
    pub emitter_type: EmitterKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationPayload {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl MutationPayload {
    /// The synthetic baseline mutation.
    pub fn init() -> Self {
        Self {
            kind: INIT_MUTATION_TYPE.to_string(),
            payload: None,
        }
    }

    pub fn is_init(&self) -> bool {
        self.kind == INIT_MUTATION_TYPE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorePayload {
    pub store_id: StoreId,
    pub mutation: MutationPayload,
    pub state: Value,
    pub subscribed_pages: Vec<PageDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// Reply to a `refreshPages` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshPagesResponse {
    pub versions: Versions,
    pub pages: Vec<PagePayload>,
    pub stores: Vec<StorePayload>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_omits_absent_lifecycle_and_type() {
        let envelope = Envelope::new(Module::Events, json!({"k": 1}));
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"module": "events", "data": {"k": 1}})
        );
    }

    #[test]
    fn lifecycle_uses_camel_case_names() {
        let envelope = Envelope::new(Module::Components, json!({}))
            .with_lifecycle(Lifecycle::BeforeDestroy)
            .with_kind("page");
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"module": "components", "lifecycle": "beforeDestroy", "type": "page", "data": {}})
        );
    }

    #[test]
    fn store_payload_uses_wire_field_names() {
        let payload = StorePayload {
            store_id: 0,
            mutation: MutationPayload::init(),
            state: json!({"count": 1}),
            subscribed_pages: vec![PageDescriptor::new("1", "pages/index/main", 0)],
            timestamp: None,
        };
        let envelope = Envelope::store(&payload).unwrap();
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "module": "vuex",
                "data": {
                    "storeId": 0,
                    "mutation": {"type": "__devtool__:init"},
                    "state": {"count": 1},
                    "subscribedPages": [{"id": "1", "route": "pages/index/main", "depth": 0}]
                }
            })
        );
    }

    #[test]
    fn versions_always_report_the_bridge() {
        let versions = Versions::new().with("vue", "2.6.10");
        assert_eq!(versions.get("vue"), Some("2.6.10"));
        assert_eq!(versions.get("bridge"), Some(env!("CARGO_PKG_VERSION")));
    }
}
