//! CSV loading for the OWID COVID-19 table.
//!
//! Columns are matched by header name, so the full upstream file (which
//! carries several dozen columns) and trimmed fixtures load the same way.
//!
//! # CSV Format
//!
//! Headered, one row per location per date:
//!
//! ```text
//! iso_code,continent,location,date,population,new_cases,new_cases_smoothed
//! DEU,Europe,Germany,2022-01-01,83369840,10000,12000.5
//! OWID_WRL,,World,2022-01-01,7975105024,1000000,1200000.0
//! ```

use crate::error::{OwidError, Result};
use crate::observation::{Observation, DATE_FORMAT};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::{debug, info};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// Columns without which the pipeline cannot run.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "location",
    "date",
    "population",
    "new_cases",
    "new_cases_smoothed",
    "continent",
];

/// Header positions of the columns the loader reads.
#[derive(Debug, Clone)]
struct ColumnIndex {
    location: usize,
    date: usize,
    population: usize,
    new_cases: usize,
    new_cases_smoothed: usize,
    continent: usize,
    iso_code: Option<usize>,
    new_deaths_smoothed: Option<usize>,
    total_cases: Option<usize>,
    total_deaths: Option<usize>,
    total_vaccinations: Option<usize>,
    icu_patients: Option<usize>,
    reproduction_rate: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let required = REQUIRED_COLUMNS.map(find);
        let [
            Some(location),
            Some(date),
            Some(population),
            Some(new_cases),
            Some(new_cases_smoothed),
            Some(continent),
        ] = required
        else {
            let missing = REQUIRED_COLUMNS
                .iter()
                .zip(required)
                .filter(|(_, position)| position.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(OwidError::MissingColumns { missing });
        };

        Ok(ColumnIndex {
            location,
            date,
            population,
            new_cases,
            new_cases_smoothed,
            continent,
            iso_code: find("iso_code"),
            new_deaths_smoothed: find("new_deaths_smoothed"),
            total_cases: find("total_cases"),
            total_deaths: find("total_deaths"),
            total_vaccinations: find("total_vaccinations"),
            icu_patients: find("icu_patients"),
            reproduction_rate: find("reproduction_rate"),
        })
    }
}

fn text(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numeric cell; empty or non-numeric text reads as null.
fn number(record: &StringRecord, index: Option<usize>) -> Option<f64> {
    index
        .and_then(|i| record.get(i))
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Population is published as "83369840" or "83369840.0"; negatives read as null.
fn population(record: &StringRecord, index: usize) -> Option<u64> {
    number(record, Some(index))
        .filter(|v| *v >= 0.0)
        .map(|v| v as u64)
}

/// Load observations from any reader over a headered OWID CSV.
pub fn load_observations<R: Read>(reader: R) -> Result<Vec<Observation>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let columns = ColumnIndex::from_headers(rdr.headers()?)?;
    debug!("loader: column positions {:?}", columns);

    let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
    let mut observations = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());

        let location = text(&record, Some(columns.location))
            .ok_or(OwidError::EmptyLocation { line })?;
        let date_str = record.get(columns.date).unwrap_or("").trim();
        let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|_| {
            OwidError::InvalidDate {
                line,
                value: date_str.to_string(),
            }
        })?;

        if !seen.insert((location.clone(), date)) {
            return Err(OwidError::DuplicateObservation { location, date });
        }

        observations.push(Observation {
            iso_code: text(&record, columns.iso_code),
            location,
            continent: text(&record, Some(columns.continent)),
            date,
            population: population(&record, columns.population),
            new_cases: number(&record, Some(columns.new_cases)),
            new_cases_smoothed: number(&record, Some(columns.new_cases_smoothed)),
            new_deaths_smoothed: number(&record, columns.new_deaths_smoothed),
            total_cases: number(&record, columns.total_cases),
            total_deaths: number(&record, columns.total_deaths),
            total_vaccinations: number(&record, columns.total_vaccinations),
            icu_patients: number(&record, columns.icu_patients),
            reproduction_rate: number(&record, columns.reproduction_rate),
        });
    }
    info!(
        "loader: Loaded {} observations for {} locations",
        observations.len(),
        seen.iter().map(|(location, _)| location).collect::<HashSet<_>>().len()
    );
    Ok(observations)
}

/// Load observations from a CSV string.
pub fn load_observations_from_str(csv_data: &str) -> Result<Vec<Observation>> {
    load_observations(csv_data.as_bytes())
}

/// Load observations from a CSV file on disk.
pub fn load_observations_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>> {
    let file = std::fs::File::open(path.as_ref())?;
    info!("loader: Reading {}", path.as_ref().display());
    load_observations(std::io::BufReader::new(file))
}
