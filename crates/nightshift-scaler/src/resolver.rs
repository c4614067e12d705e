//! Workload resolution: exclusions out, priorities assigned
//!
//! Turns the flat workload listing of a namespace into priority groups the
//! executor walks in order.

use std::collections::BTreeMap;

use crate::pattern::{is_excluded, sequence_index};
use crate::workload::Workload;

/// Group a namespace's workloads by scale priority.
///
/// Excluded workloads are dropped entirely; they are never written to.
/// Remaining workloads get the index of their first matching sequence
/// element (or the sentinel priority when nothing matches). Within a
/// priority, ordering is by kind then name so runs are reproducible.
pub fn group_by_priority(
    workloads: Vec<Workload>,
    sequence: &[String],
    exclusions: &[String],
) -> BTreeMap<usize, Vec<Workload>> {
    let mut groups: BTreeMap<usize, Vec<Workload>> = BTreeMap::new();
    for workload in workloads {
        if is_excluded(&workload.name, exclusions) {
            continue;
        }
        let priority = sequence_index(&workload.name, sequence);
        groups.entry(priority).or_default().push(workload);
    }
    for group in groups.values_mut() {
        group.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
    }
    groups
}
