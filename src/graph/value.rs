//! Live object graph handed over by the host application.
//!
//! Objects and arrays are shared cells so the host can build the same
//! back-references (component → store → subscriber list → component) that
//! exist in the running application. Identity is the address of the cell.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::{Number, Value};

/// Shared, mutable keyed object.
pub type ObjectRef = Rc<RefCell<LiveObject>>;

/// Shared, mutable ordered sequence.
pub type ArrayRef = Rc<RefCell<Vec<LiveValue>>>;

/// A value reachable from host framework objects. May contain cycles.
#[derive(Clone)]
pub enum LiveValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(ArrayRef),
    Object(ObjectRef),
    /// Function, native handle, or anything else without enumerable data.
    /// Carries the type name only.
    Opaque(String),
}

/// Keyed object with insertion-ordered fields and an optional class name.
#[derive(Clone, Default)]
pub struct LiveObject {
    class: Option<String>,
    fields: Vec<(String, LiveValue)>,
}

impl LiveObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Object created by a named constructor (non-plain object).
    pub fn with_class(class: impl Into<String>) -> Self {
        Self {
            class: Some(class.into()),
            fields: Vec::new(),
        }
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Set a field, replacing an existing value in place so key order is kept.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<LiveValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&LiveValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<LiveValue> {
        let idx = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(idx).1)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &LiveValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Wrap into a shared cell.
    pub fn into_ref(self) -> ObjectRef {
        Rc::new(RefCell::new(self))
    }
}

impl LiveValue {
    /// New empty plain object, returned together with its handle so callers
    /// can wire back-references after construction.
    pub fn new_object() -> (LiveValue, ObjectRef) {
        let obj = LiveObject::new().into_ref();
        (LiveValue::Object(obj.clone()), obj)
    }

    pub fn new_array(items: Vec<LiveValue>) -> (LiveValue, ArrayRef) {
        let arr = Rc::new(RefCell::new(items));
        (LiveValue::Array(arr.clone()), arr)
    }

    /// Build a plain object from `(key, value)` pairs.
    pub fn object<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> LiveValue
    where
        K: Into<String>,
        V: Into<LiveValue>,
    {
        let mut obj = LiveObject::new();
        for (k, v) in fields {
            obj.insert(k, v);
        }
        LiveValue::Object(obj.into_ref())
    }

    pub fn array(items: impl IntoIterator<Item = LiveValue>) -> LiveValue {
        LiveValue::new_array(items.into_iter().collect()).0
    }

    pub fn opaque(type_name: impl Into<String>) -> LiveValue {
        LiveValue::Opaque(type_name.into())
    }

    /// Identity of the underlying cell for composite values.
    pub fn identity(&self) -> Option<usize> {
        match self {
            LiveValue::Array(arr) => Some(rc_identity(arr)),
            LiveValue::Object(obj) => Some(rc_identity(obj)),
            _ => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, LiveValue::Array(_) | LiveValue::Object(_))
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            LiveValue::Object(obj) => Some(obj),
            _ => None,
        }
    }
}

/// Address of a shared allocation, used as its identity. Thin-pointer cast so
/// trait objects compare by data address only.
pub(crate) fn rc_identity<T: ?Sized>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}

impl fmt::Debug for LiveValue {
    // Shallow on purpose: a derived impl would recurse forever on cycles.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveValue::Null => f.write_str("Null"),
            LiveValue::Bool(b) => write!(f, "Bool({b})"),
            LiveValue::Number(n) => write!(f, "Number({n})"),
            LiveValue::String(s) => write!(f, "String({s:?})"),
            LiveValue::Array(arr) => write!(f, "Array(@{:#x})", rc_identity(arr)),
            LiveValue::Object(obj) => match obj.try_borrow() {
                Ok(o) => write!(
                    f,
                    "Object({}@{:#x}, {} fields)",
                    o.class().unwrap_or("Object"),
                    rc_identity(obj),
                    o.len()
                ),
                Err(_) => write!(f, "Object(@{:#x}, borrowed)", rc_identity(obj)),
            },
            LiveValue::Opaque(t) => write!(f, "Opaque({t})"),
        }
    }
}

impl fmt::Debug for LiveObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveObject")
            .field("class", &self.class)
            .field("keys", &self.fields.iter().map(|(k, _)| k).collect::<Vec<_>>())
            .finish()
    }
}

impl From<bool> for LiveValue {
    fn from(b: bool) -> Self {
        LiveValue::Bool(b)
    }
}

impl From<i64> for LiveValue {
    fn from(n: i64) -> Self {
        LiveValue::Number(n.into())
    }
}

impl From<u64> for LiveValue {
    fn from(n: u64) -> Self {
        LiveValue::Number(n.into())
    }
}

impl From<i32> for LiveValue {
    fn from(n: i32) -> Self {
        LiveValue::Number(n.into())
    }
}

impl From<f64> for LiveValue {
    /// NaN and infinities have no JSON form and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(LiveValue::Null, LiveValue::Number)
    }
}

impl From<&str> for LiveValue {
    fn from(s: &str) -> Self {
        LiveValue::String(s.to_string())
    }
}

impl From<String> for LiveValue {
    fn from(s: String) -> Self {
        LiveValue::String(s)
    }
}

impl From<ObjectRef> for LiveValue {
    fn from(obj: ObjectRef) -> Self {
        LiveValue::Object(obj)
    }
}

impl From<ArrayRef> for LiveValue {
    fn from(arr: ArrayRef) -> Self {
        LiveValue::Array(arr)
    }
}

impl From<Value> for LiveValue {
    /// Deep conversion; every composite becomes a fresh, unshared cell.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => LiveValue::Null,
            Value::Bool(b) => LiveValue::Bool(b),
            Value::Number(n) => LiveValue::Number(n),
            Value::String(s) => LiveValue::String(s),
            Value::Array(items) => LiveValue::array(items.into_iter().map(LiveValue::from)),
            Value::Object(map) => LiveValue::object(map),
        }
    }
}
