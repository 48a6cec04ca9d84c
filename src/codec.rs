//! JSON codecs for the two on-disk formats the job passes between phases.
//!
//! Intermediate partition files hold a self-describing array of key/value
//! records; reduce output files hold a single object mapping each key to its
//! reduced value. Both are UTF-8 text and both round-trip, so a later merge
//! stage can read any reduce output back as a table and combine keys.

use crate::KeyValue;
use std::collections::BTreeMap;

/// Encode a sequence of intermediate pairs as a JSON array of named-field
/// records.
pub fn encode_pairs(pairs: &[KeyValue]) -> serde_json::Result<String> {
    serde_json::to_string(pairs)
}

/// Decode the full contents of an intermediate partition file.
pub fn decode_pairs(text: &str) -> serde_json::Result<Vec<KeyValue>> {
    serde_json::from_str(text)
}

/// Encode a result table as a single JSON object.
///
/// [`BTreeMap`] iterates in ascending key order, so the object's keys appear
/// in ascending lexicographic order and the encoding is byte-stable across
/// runs.
pub fn encode_table(table: &BTreeMap<String, String>) -> serde_json::Result<String> {
    serde_json::to_string(table)
}

/// Decode a reduce output file back into its result table.
pub fn decode_table(text: &str) -> serde_json::Result<BTreeMap<String, String>> {
    serde_json::from_str(text)
}
