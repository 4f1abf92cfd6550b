//! CSV and JSON writers for enriched rows and snapshot tables.

use covid_data::enrich::{EnrichedObservation, CSV_HEADERS};
use covid_data::snapshot::SnapshotRow;
use covid_owid::observation::DATE_FORMAT;
use serde::Serialize;
use std::io::Write;

/// Columns of the latest-day table.
pub const SNAPSHOT_HEADERS: [&str; 10] = [
    "location",
    "continent",
    "date",
    "population",
    "country_size",
    "new_cases_smoothed",
    "incident_rate",
    "week_incidence_rank",
    "case_growth_7d",
    "case_growth_7d_formatted",
];

pub fn write_enriched_csv<W: Write>(rows: &[EnrichedObservation], writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADERS)?;
    for row in rows {
        wtr.write_record(row.to_record())?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_snapshot_csv<W: Write>(rows: &[SnapshotRow], writer: W) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SNAPSHOT_HEADERS)?;
    for snapshot in rows {
        let o = &snapshot.row.observation;
        wtr.write_record([
            o.location.clone(),
            o.continent.clone().unwrap_or_default(),
            o.date.format(DATE_FORMAT).to_string(),
            o.population.map_or(String::new(), |p| p.to_string()),
            snapshot
                .row
                .country_size
                .map_or(String::new(), |s| s.label().to_string()),
            o.new_cases_smoothed.map_or(String::new(), |v| v.to_string()),
            snapshot.row.incident_rate.to_string(),
            snapshot.week_incidence_rank.to_string(),
            snapshot.row.case_growth_7d.to_string(),
            snapshot.row.case_growth_7d_formatted.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized, W: Write>(value: &T, mut writer: W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}
