//! Location-partitioned, date-ordered view over a row slice.
//!
//! Rolling and percentage-change computations never cross a partition
//! boundary. Results are returned aligned with the input slice, so the
//! caller's row order is preserved.

use covid_owid::observation::Observation;
use log::debug;
use std::collections::BTreeMap;

/// Index from location to the positions of its rows, sorted by date.
#[derive(Debug, Clone, Default)]
pub struct LocationIndex<'a> {
    partitions: BTreeMap<&'a str, Vec<usize>>,
}

impl<'a> LocationIndex<'a> {
    pub fn build(rows: &'a [Observation]) -> Self {
        let mut partitions: BTreeMap<&'a str, Vec<usize>> = BTreeMap::new();
        for (position, row) in rows.iter().enumerate() {
            partitions
                .entry(row.location.as_str())
                .or_default()
                .push(position);
        }
        for positions in partitions.values_mut() {
            // stable: equal dates keep input order
            positions.sort_by_key(|&p| rows[p].date);
        }
        debug!(
            "partition: {} rows across {} locations",
            rows.len(),
            partitions.len()
        );
        LocationIndex { partitions }
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Row positions for one location in date order.
    pub fn positions(&self, location: &str) -> Option<&[usize]> {
        self.partitions.get(location).map(Vec::as_slice)
    }

    /// Trailing sum over the current row and up to `window - 1` earlier rows
    /// of the same location. Nulls count as zero; short histories use
    /// whatever rows exist.
    pub fn rolling_sum<F>(&self, rows: &[Observation], window: usize, value: F) -> Vec<f64>
    where
        F: Fn(&Observation) -> Option<f64>,
    {
        let mut result = vec![0.0; rows.len()];
        for positions in self.partitions.values() {
            for (i, &position) in positions.iter().enumerate() {
                let start = (i + 1).saturating_sub(window);
                result[position] = positions[start..=i]
                    .iter()
                    .map(|&p| value(&rows[p]).unwrap_or(0.0))
                    .sum();
            }
        }
        result
    }

    /// Simple percentage change against the row `periods` earlier in the same
    /// location: `(v[i] - v[i - periods]) / v[i - periods]`.
    ///
    /// Zero when there is no such row, when either value is null, or when the
    /// earlier value is zero.
    pub fn pct_change<F>(&self, rows: &[Observation], periods: usize, value: F) -> Vec<f64>
    where
        F: Fn(&Observation) -> Option<f64>,
    {
        let mut result = vec![0.0; rows.len()];
        for positions in self.partitions.values() {
            for (i, &position) in positions.iter().enumerate().skip(periods) {
                let current = value(&rows[position]);
                let previous = value(&rows[positions[i - periods]]);
                result[position] = match (current, previous) {
                    (Some(current), Some(previous)) if previous != 0.0 => {
                        let change = (current - previous) / previous;
                        if change.is_finite() {
                            change
                        } else {
                            0.0
                        }
                    }
                    _ => 0.0,
                };
            }
        }
        result
    }
}
