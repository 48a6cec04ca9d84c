//! A MapReduce-compatible implementation of word count.
//!

use crate::KeyValue;

/// Emit one `(word, "")` pair per word of the input.
///
/// A word is a maximal run of ASCII letters; case is preserved.
pub fn map(_name: &str, contents: &str) -> Vec<KeyValue> {
    contents
        .split(|c: char| !c.is_ascii_alphabetic())
        .filter(|w| !w.is_empty())
        .map(|w| KeyValue::new(w, ""))
        .collect()
}

/// The reduced value for a word is how many times it was seen.
pub fn reduce(_key: &str, values: &[String]) -> String {
    values.len().to_string()
}
