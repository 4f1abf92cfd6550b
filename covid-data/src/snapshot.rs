//! Latest-day snapshot with weekly incidence ranking.

use crate::enrich::EnrichedObservation;
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

/// A row of the latest-day table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotRow {
    #[serde(flatten)]
    pub row: EnrichedObservation,
    /// Ascending rank of `incident_rate`; 1 is the lowest. Ties share the
    /// average of the positions they span.
    pub week_incidence_rank: f64,
}

/// Most recent date in the table.
pub fn latest_date(rows: &[EnrichedObservation]) -> Option<NaiveDate> {
    rows.iter().map(|row| row.observation.date).max()
}

/// Ascending average ranks, aligned with `values`.
pub fn average_rank(values: &[i64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by_key(|&i| values[i]);

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        // positions start..=end hold 1-based ranks start+1..=end+1
        let rank = (start + end + 2) as f64 / 2.0;
        for &i in &order[start..=end] {
            ranks[i] = rank;
        }
        start = end + 1;
    }
    ranks
}

/// Rows on the maximum date, each carrying its incidence rank among them.
///
/// Rows keep their input order. An empty table yields an empty snapshot.
pub fn latest_snapshot(rows: &[EnrichedObservation]) -> Vec<SnapshotRow> {
    let Some(latest) = latest_date(rows) else {
        return Vec::new();
    };
    let latest_rows: Vec<&EnrichedObservation> = rows
        .iter()
        .filter(|row| row.observation.date == latest)
        .collect();
    let rates: Vec<i64> = latest_rows.iter().map(|row| row.incident_rate).collect();
    let ranks = average_rank(&rates);
    debug!("snapshot: {} rows on {}", latest_rows.len(), latest);

    latest_rows
        .into_iter()
        .zip(ranks)
        .map(|(row, week_incidence_rank)| SnapshotRow {
            row: row.clone(),
            week_incidence_rank,
        })
        .collect()
}
