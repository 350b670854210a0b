//! Decycled copies of live component trees.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::value::rc_identity;
use crate::graph::{GraphFlattener, MAX_DEPTH_LIMIT};
use crate::host::{ComponentKind, ComponentRef};

/// Owned, acyclic mirror of a component and its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    pub name: String,
    pub kind: ComponentKind,
    pub props: Value,
    pub data: Value,
    pub children: Vec<ComponentSnapshot>,
    /// Children were cut by the component depth bound or a tree cycle.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
}

/// Builds [`ComponentSnapshot`]s with a fixed flattener and tree depth bound.
#[derive(Debug, Clone)]
pub struct Snapshotter {
    flattener: GraphFlattener,
    max_component_depth: usize,
}

impl Snapshotter {
    pub fn new(flattener: GraphFlattener, max_component_depth: usize) -> Self {
        Self {
            flattener,
            max_component_depth: max_component_depth.min(MAX_DEPTH_LIMIT),
        }
    }

    pub fn flattener(&self) -> &GraphFlattener {
        &self.flattener
    }

    pub fn snapshot(&self, component: &ComponentRef) -> ComponentSnapshot {
        let mut path = Vec::new();
        self.visit(component, 0, &mut path)
    }

    fn visit(
        &self,
        component: &ComponentRef,
        depth: usize,
        path: &mut Vec<usize>,
    ) -> ComponentSnapshot {
        let kind = component.kind();
        let name = component
            .name()
            .unwrap_or_else(|| default_name(kind).to_string());

        path.push(rc_identity(component));
        let mut truncated = false;
        let mut children = Vec::new();
        for child in component.children() {
            if depth >= self.max_component_depth || path.contains(&rc_identity(&child)) {
                truncated = true;
                continue;
            }
            children.push(self.visit(&child, depth + 1, path));
        }
        path.pop();

        ComponentSnapshot {
            name,
            kind,
            props: self.flattener.flatten(&component.props()),
            data: self.flattener.flatten(&component.data()),
            children,
            truncated,
        }
    }
}

fn default_name(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::App => "App",
        ComponentKind::Page => "Page",
        ComponentKind::Component => "Anonymous",
    }
}
