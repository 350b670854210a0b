//! Live object graph model and the flattener that turns it into
//! transmittable data.

pub mod flatten;
pub mod value;

pub use flatten::{flatten, GraphFlattener, Sentinel, MAX_DEPTH_LIMIT, ROOT_PATH, SENTINEL_KEY};
pub use value::{ArrayRef, LiveObject, LiveValue, ObjectRef};
