//! Decycling: live graph → bounded, acyclic `serde_json::Value`.

use std::borrow::Cow;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value::{rc_identity, LiveValue};

/// Key that marks a JSON object as a sentinel.
///
/// Host fields named `$sentinel`, `$$sentinel` and so on are written with one
/// extra leading `$`, so only markers produced by the flattener carry this key.
pub const SENTINEL_KEY: &str = "$sentinel";

/// Upper bound on `max_depth`. The walk recurses once per level, so larger
/// bounds are clamped to keep the stack bounded.
pub const MAX_DEPTH_LIMIT: usize = 256;

/// Path description of the traversal root inside circular sentinels.
pub const ROOT_PATH: &str = "~";

/// Marker substituted for substructure that was not copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "$sentinel", rename_all = "snake_case")]
pub enum Sentinel {
    /// Field name is on the exclusion list.
    Excluded,
    /// Object already on the current path; `path` locates the ancestor.
    Circular { path: String },
    /// Composite value deeper than the configured bound.
    MaxDepth,
    /// Function, handle or data-less typed object.
    Opaque {
        #[serde(rename = "type")]
        type_name: String,
    },
}

impl Sentinel {
    pub fn opaque(type_name: impl Into<String>) -> Self {
        Sentinel::Opaque {
            type_name: type_name.into(),
        }
    }

    pub fn into_value(self) -> Value {
        let mut map = Map::new();
        match self {
            Sentinel::Excluded => {
                map.insert(SENTINEL_KEY.into(), "excluded".into());
            }
            Sentinel::Circular { path } => {
                map.insert(SENTINEL_KEY.into(), "circular".into());
                map.insert("path".into(), path.into());
            }
            Sentinel::MaxDepth => {
                map.insert(SENTINEL_KEY.into(), "max_depth".into());
            }
            Sentinel::Opaque { type_name } => {
                map.insert(SENTINEL_KEY.into(), "opaque".into());
                map.insert("type".into(), type_name.into());
            }
        }
        Value::Object(map)
    }

    /// Recognise a sentinel in flattened output.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if !obj.contains_key(SENTINEL_KEY) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

/// Depth-bounded, key-filtered flattener.
///
/// Depth starts at 0 for the root and grows by one per composite descent. A
/// composite found at a depth greater than `max_depth` is replaced with
/// [`Sentinel::MaxDepth`]; primitives are always copied.
#[derive(Debug, Clone)]
pub struct GraphFlattener {
    max_depth: usize,
    excluded_keys: HashSet<String>,
}

impl GraphFlattener {
    pub fn new<I, S>(max_depth: usize, excluded_keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if max_depth > MAX_DEPTH_LIMIT {
            tracing::debug!(max_depth, limit = MAX_DEPTH_LIMIT, "clamping flatten depth");
        }
        Self {
            max_depth: max_depth.min(MAX_DEPTH_LIMIT),
            excluded_keys: excluded_keys.into_iter().map(Into::into).collect(),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_excluded(&self, key: &str) -> bool {
        self.excluded_keys.contains(key)
    }

    /// Produce an owned, acyclic copy of `value`. Never fails, never mutates
    /// the source.
    pub fn flatten(&self, value: &LiveValue) -> Value {
        let mut walk = Walk {
            flattener: self,
            ancestors: Vec::new(),
        };
        walk.visit(value, ROOT_PATH.to_string(), 0)
    }
}

/// `flatten(value, max_depth, excluded_keys)` without keeping a flattener around.
pub fn flatten(value: &LiveValue, max_depth: usize, excluded_keys: &[&str]) -> Value {
    GraphFlattener::new(max_depth, excluded_keys.iter().copied()).flatten(value)
}

struct Walk<'a> {
    flattener: &'a GraphFlattener,
    /// Objects on the current path: identity and path description.
    ancestors: Vec<(usize, String)>,
}

impl Walk<'_> {
    fn visit(&mut self, value: &LiveValue, path: String, depth: usize) -> Value {
        match value {
            LiveValue::Null => Value::Null,
            LiveValue::Bool(b) => Value::Bool(*b),
            LiveValue::Number(n) => Value::Number(n.clone()),
            LiveValue::String(s) => Value::String(s.clone()),
            LiveValue::Opaque(type_name) => Sentinel::opaque(type_name.as_str()).into_value(),
            LiveValue::Array(arr) => {
                let id = rc_identity(arr);
                if let Some(sentinel) = self.cut(id, depth) {
                    return sentinel.into_value();
                }
                let Ok(items) = arr.try_borrow() else {
                    return Sentinel::opaque("Array").into_value();
                };

                self.ancestors.push((id, path.clone()));
                let out = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.visit(item, format!("{path}[{i}]"), depth + 1))
                    .collect();
                self.ancestors.pop();
                Value::Array(out)
            }
            LiveValue::Object(obj) => {
                let id = rc_identity(obj);
                if let Some(sentinel) = self.cut(id, depth) {
                    return sentinel.into_value();
                }
                let Ok(object) = obj.try_borrow() else {
                    return Sentinel::opaque("Object").into_value();
                };
                if object.is_empty() {
                    if let Some(class) = object.class() {
                        return Sentinel::opaque(class).into_value();
                    }
                }

                self.ancestors.push((id, path.clone()));
                let mut map = Map::new();
                for (key, field) in object.fields() {
                    let flat = if self.flattener.is_excluded(key) {
                        Sentinel::Excluded.into_value()
                    } else {
                        self.visit(field, format!("{path}.{key}"), depth + 1)
                    };
                    map.insert(escape_key(key).into_owned(), flat);
                }
                self.ancestors.pop();
                Value::Object(map)
            }
        }
    }

    fn cut(&self, id: usize, depth: usize) -> Option<Sentinel> {
        if let Some((_, ancestor)) = self.ancestors.iter().find(|(a, _)| *a == id) {
            return Some(Sentinel::Circular {
                path: ancestor.clone(),
            });
        }
        if depth > self.flattener.max_depth {
            return Some(Sentinel::MaxDepth);
        }
        None
    }
}

/// Prefix host keys that could be mistaken for [`SENTINEL_KEY`] with one more `$`.
fn escape_key(key: &str) -> Cow<'_, str> {
    let bare = key.trim_start_matches('$');
    if bare.len() < key.len() && bare == &SENTINEL_KEY[1..] {
        Cow::Owned(format!("${key}"))
    } else {
        Cow::Borrowed(key)
    }
}
