//! Naming helpers shared by the map and reduce phases.
//!
//! The map phase (which runs elsewhere) and the reduce core in this crate
//! must agree on how intermediate partition files are named; any divergence
//! shows up as read failures on the reduce side.

/// Name of the intermediate file holding the pairs that map task `map_task`
/// hash-partitioned into reduce task `reduce_task`'s bucket.
///
/// A pure function of its inputs: the same triple always yields the same
/// name.
pub fn reduce_name(job_name: &str, map_task: u32, reduce_task: u32) -> String {
    format!("mrtmp.{}-{}-{}", job_name, map_task, reduce_task)
}
