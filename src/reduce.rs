//! The reduce side of a job: merge intermediate partitions, group by key,
//! aggregate, and persist.
//!
//! One call to [`do_reduce`] handles one reduce task. Distinct reduce-task
//! indices read disjoint partition files and write disjoint outputs, so they
//! may run concurrently in separate threads or processes without locking;
//! two executions with the *same* index would race on the same output path
//! and must not run together.

use crate::codec;
use crate::utils::reduce_name;
use crate::KeyValue;
use itertools::Itertools;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Transient mapping from key to every value recorded for it, in
/// partition-read order (map-task index ascending).
pub type GroupedTable = HashMap<String, Vec<String>>;

/// Why a reduce task failed.
///
/// All of these are non-recoverable here: the task never skips a bad
/// partition and continues, since a missing contribution would silently
/// corrupt the aggregate for every key that partition held values for.
/// The orchestration layer decides whether to retry the whole task.
#[derive(Debug, Error)]
pub enum ReduceError {
    /// An expected intermediate partition file is missing or unreadable.
    #[error("cannot read intermediate file `{path}`")]
    ReadIntermediate {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A partition file's contents do not parse as a pair array.
    #[error("cannot decode intermediate file `{path}`")]
    DecodeIntermediate {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The output file cannot be created, written, or renamed into place.
    #[error("cannot write output file `{path}`")]
    WriteOutput {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read and decode every intermediate partition belonging to reduce task
/// `reduce_task`, grouping the decoded pairs by key.
///
/// One partition is read per map task, named by
/// [`reduce_name`](crate::utils::reduce_name). The value sequence for each
/// key ends up in partition-read order: all values from map task 0 first,
/// then map task 1, and so on. Nothing is written or deleted.
///
/// Fails on the first partition that is missing, unreadable, or undecodable,
/// so a task with incomplete inputs never proceeds to aggregation.
pub fn merge_intermediates(
    job_name: &str,
    reduce_task: u32,
    n_map: u32,
) -> Result<GroupedTable, ReduceError> {
    let mut grouped = GroupedTable::new();
    for map_task in 0..n_map {
        let path = reduce_name(job_name, map_task, reduce_task);
        let text = fs::read_to_string(&path).map_err(|source| ReduceError::ReadIntermediate {
            path: path.clone(),
            source,
        })?;
        let pairs =
            codec::decode_pairs(&text).map_err(|source| ReduceError::DecodeIntermediate {
                path: path.clone(),
                source,
            })?;
        debug!("merged {} pairs from {}", pairs.len(), path);
        for KeyValue { key, value } in pairs {
            grouped.entry(key).or_default().push(value);
        }
    }
    Ok(grouped)
}

/// Aggregate a grouped table and persist the result to `out_file`.
///
/// Keys are visited in ascending lexicographic order and `reduce_fn` is
/// invoked exactly once per distinct key with its full ordered value
/// sequence. Ordering is a contract, not an optimization: the downstream
/// merge stage expects deterministic key order, and re-running against
/// unchanged inputs must reproduce the output byte for byte.
///
/// The table is written to a temporary file in the destination directory and
/// renamed onto `out_file`, so readers of a previous output never observe a
/// partial write; on failure the previous content is left untouched.
pub fn reduce_and_write<F>(
    grouped: GroupedTable,
    reduce_fn: F,
    out_file: &Path,
) -> Result<(), ReduceError>
where
    F: Fn(&str, &[String]) -> String,
{
    let mut result = BTreeMap::new();
    for (key, values) in grouped.into_iter().sorted_by(|a, b| a.0.cmp(&b.0)) {
        let reduced = reduce_fn(&key, &values);
        result.insert(key, reduced);
    }
    write_table(&result, out_file)
}

/// Run one whole reduce task: merge the `n_map` intermediate partitions for
/// `reduce_task`, aggregate per key, and write the result table to
/// `out_file`.
///
/// This is the entry point the job driver calls once per reduce task. Any
/// I/O or decode failure propagates to the caller; nothing is swallowed.
pub fn do_reduce<F>(
    job_name: &str,
    reduce_task: u32,
    out_file: &str,
    n_map: u32,
    reduce_fn: F,
) -> Result<(), ReduceError>
where
    F: Fn(&str, &[String]) -> String,
{
    debug!(
        "reduce task {} of job {}: merging {} partitions into {}",
        reduce_task, job_name, n_map, out_file
    );
    let grouped = merge_intermediates(job_name, reduce_task, n_map)?;
    reduce_and_write(grouped, reduce_fn, Path::new(out_file))
}

fn write_table(table: &BTreeMap<String, String>, out_file: &Path) -> Result<(), ReduceError> {
    let write_err = |source: std::io::Error| ReduceError::WriteOutput {
        path: out_file.display().to_string(),
        source,
    };
    let dir = match out_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let text = codec::encode_table(table).map_err(|e| write_err(e.into()))?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.persist(out_file).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn grouped(entries: &[(&str, &[&str])]) -> GroupedTable {
        entries
            .iter()
            .map(|(k, vs)| {
                (
                    k.to_string(),
                    vs.iter().map(|v| v.to_string()).collect::<Vec<_>>(),
                )
            })
            .collect()
    }

    #[test]
    fn writes_keys_in_ascending_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let table = grouped(&[("dog", &["", ""]), ("ant", &[""]), ("cat", &[""])]);
        reduce_and_write(table, |_, vs| vs.len().to_string(), &out).unwrap();
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            r#"{"ant":"1","cat":"1","dog":"2"}"#
        );
    }

    #[test]
    fn invokes_reduce_once_per_distinct_key() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let calls = AtomicUsize::new(0);
        let table = grouped(&[("a", &["1", "2", "3"]), ("b", &["4"]), ("c", &["5", "6"])]);
        reduce_and_write(
            table,
            |_, vs| {
                calls.fetch_add(1, Ordering::SeqCst);
                vs.len().to_string()
            },
            &out,
        )
        .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn reduce_sees_values_in_recorded_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let table = grouped(&[("k", &["first", "second", "third"])]);
        reduce_and_write(table, |_, vs| vs.join(","), &out).unwrap();
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            r#"{"k":"first,second,third"}"#
        );
    }

    #[test]
    fn result_keys_match_grouped_keys_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let table = grouped(&[("x", &[""]), ("y", &[""]), ("z", &[""])]);
        reduce_and_write(table, |k, _| k.to_uppercase(), &out).unwrap();
        let decoded = codec::decode_table(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(
            decoded.keys().cloned().collect::<Vec<_>>(),
            vec!["x", "y", "z"]
        );
        assert_eq!(decoded["x"], "X");
    }

    #[test]
    fn empty_grouped_table_writes_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        reduce_and_write(GroupedTable::new(), |_, _| unreachable!(), &out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "{}");
    }

    #[test]
    fn overwrites_previous_output_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        fs::write(&out, "stale").unwrap();
        reduce_and_write(grouped(&[("k", &[""])]), |_, _| "v".into(), &out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), r#"{"k":"v"}"#);
    }

    #[test]
    fn unwritable_output_path_is_a_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("no-such-dir").join("out");
        let err = reduce_and_write(grouped(&[("k", &[""])]), |_, _| "v".into(), &out)
            .expect_err("write into a missing directory must fail");
        assert!(matches!(err, ReduceError::WriteOutput { .. }));
    }
}
