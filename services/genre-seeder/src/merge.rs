//!
//! src/merge.rs  Andrew Belles  Oct 19th, 2026
//!
//! Appends a freshly fetched batch to the prior dataset and drops
//! every row whose (track_id, genre) was already seen
//!

use std::collections::HashSet;

use crate::record::TrackFeatureRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub kept: usize,                // prior rows carried over
    pub appended: usize,            // new rows added after them
    pub duplicates: usize,          // fetched rows discarded
    pub prior_duplicates: usize     // prior rows that already repeated a key
}

/// First occurrence wins: prior rows in file order, then batch rows in
/// fetch order. Surviving rows keep their relative order
pub fn merge(
    prior: Vec<TrackFeatureRecord>,
    batch: Vec<TrackFeatureRecord>
) -> (Vec<TrackFeatureRecord>, MergeReport) {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(prior.len() + batch.len());
    let mut merged = Vec::with_capacity(prior.len() + batch.len());
    let mut report = MergeReport::default();

    for row in prior {
        if seen.insert(row.dedup_key()) {
            merged.push(row);
            report.kept += 1;
        } else {
            report.prior_duplicates += 1;
        }
    }

    for row in batch {
        if seen.insert(row.dedup_key()) {
            merged.push(row);
            report.appended += 1;
        } else {
            report.duplicates += 1;
        }
    }

    (merged, report)
}
