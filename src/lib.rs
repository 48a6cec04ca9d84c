//! The reduce-merge core of a batch MapReduce job.
//!
//! Given the intermediate key/value output already partitioned across a
//! fixed number of map tasks, this crate merges all partitions belonging to
//! one reduce task, groups values by key, applies a user-supplied reduce
//! function once per distinct key, and persists the result as a single
//! JSON object that a later stage can merge with the outputs of the other
//! reduce tasks. Scheduling, transport, and the map phase that produces the
//! intermediate files live elsewhere; this crate only assumes those files
//! already exist on stable storage.

use serde::{Deserialize, Serialize};

pub mod codec;
pub mod reduce;
pub mod utils;
pub mod workload;

/////////////////////////////////////////////////////////////////////////////
// MapReduce application types
/////////////////////////////////////////////////////////////////////////////

/// A map function takes the name of an input file and its full contents.
///
/// It returns the intermediate key-value pairs emitted for that input.
pub type MapFn = fn(name: &str, contents: &str) -> Vec<KeyValue>;

/// A reduce function takes a key and the ordered sequence of all values
/// recorded for that key across every map task. It returns the single
/// reduced value for the key.
///
/// It must be a pure function of its inputs: the core invokes it exactly
/// once per distinct key and writes whatever it returns.
pub type ReduceFn = fn(key: &str, values: &[String]) -> String;

/// A map reduce application.
#[derive(Copy, Clone)]
pub struct Workload {
    pub map_fn: MapFn,
    pub reduce_fn: ReduceFn,
}

/////////////////////////////////////////////////////////////////////////////
// Key-value pairs
/////////////////////////////////////////////////////////////////////////////

/// A single key-value pair.
///
/// The same key may appear many times across and within partitions; pairs
/// are immutable once decoded.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Serialize, Deserialize)]
pub struct KeyValue {
    /// The key.
    pub key: String,
    /// The value.
    pub value: String,
}

impl KeyValue {
    /// Construct a new key-value pair from the given key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}
