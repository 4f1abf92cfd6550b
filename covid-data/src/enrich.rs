//! Derived epidemiological columns.

use crate::partition::LocationIndex;
use covid_owid::country_size::CountrySize;
use covid_owid::observation::{Observation, DATE_FORMAT};
use log::debug;
use serde::Serialize;

/// Rows summed for the trailing weekly case count.
pub const ACTIVE_WINDOW: usize = 7;

/// Incidence is reported per this many inhabitants.
pub const INCIDENCE_SCALE: f64 = 100_000.0;

pub const GROWTH_WINDOW_DAY: usize = 1;
pub const GROWTH_WINDOW_WEEK: usize = 7;
pub const GROWTH_WINDOW_MONTH: usize = 30;

/// An observation together with the derived fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedObservation {
    #[serde(flatten)]
    pub observation: Observation,
    pub active_new_week: f64,
    pub incident_rate: i64,
    pub country_size: Option<CountrySize>,
    pub case_growth_1d: f64,
    pub case_growth_7d: f64,
    pub case_growth_30d: f64,
    pub case_growth_7d_formatted: String,
}

/// Column order of [`EnrichedObservation::to_record`].
pub const CSV_HEADERS: [&str; 21] = [
    "iso_code",
    "continent",
    "location",
    "date",
    "population",
    "new_cases",
    "new_cases_smoothed",
    "new_deaths_smoothed",
    "total_cases",
    "total_deaths",
    "total_vaccinations",
    "icu_patients",
    "reproduction_rate",
    "active_new_week",
    "incident_rate",
    "country_size",
    "case_growth_1d",
    "case_growth_7d",
    "case_growth_30d",
    "case_growth_7d_formatted",
    "is_aggregate",
];

fn cell(value: Option<f64>) -> String {
    value.map_or(String::new(), |v| v.to_string())
}

impl EnrichedObservation {
    pub fn location(&self) -> &str {
        &self.observation.location
    }

    pub fn is_aggregate(&self) -> bool {
        self.observation.is_aggregate()
    }

    /// Flat CSV row; nulls are written as empty cells.
    pub fn to_record(&self) -> Vec<String> {
        let o = &self.observation;
        vec![
            o.iso_code.clone().unwrap_or_default(),
            o.continent.clone().unwrap_or_default(),
            o.location.clone(),
            o.date.format(DATE_FORMAT).to_string(),
            o.population.map_or(String::new(), |p| p.to_string()),
            cell(o.new_cases),
            cell(o.new_cases_smoothed),
            cell(o.new_deaths_smoothed),
            cell(o.total_cases),
            cell(o.total_deaths),
            cell(o.total_vaccinations),
            cell(o.icu_patients),
            cell(o.reproduction_rate),
            self.active_new_week.to_string(),
            self.incident_rate.to_string(),
            self.country_size.map_or(String::new(), |s| s.label().to_string()),
            self.case_growth_1d.to_string(),
            self.case_growth_7d.to_string(),
            self.case_growth_30d.to_string(),
            self.case_growth_7d_formatted.clone(),
            o.is_aggregate().to_string(),
        ]
    }
}

/// Trailing seven-row sum of `new_cases` per location (`active_new_week`).
pub fn rolling_active_cases(rows: &[Observation]) -> Vec<f64> {
    LocationIndex::build(rows).rolling_sum(rows, ACTIVE_WINDOW, |o| o.new_cases)
}

/// Weekly cases per 100k inhabitants, truncated toward zero.
///
/// Computed as `active / population * 100_000` in that order, so a quotient
/// just below a whole number truncates down: 70 cases in 1,000,000 people
/// gives 6, not 7.
///
/// Zero for a null or zero population and for any non-finite or negative result.
pub fn incidence_rate(active_new_week: f64, population: Option<u64>) -> i64 {
    match population {
        Some(population) if population > 0 => {
            let rate = active_new_week / population as f64 * INCIDENCE_SCALE;
            if rate.is_finite() {
                (rate.trunc() as i64).max(0)
            } else {
                0
            }
        }
        _ => 0,
    }
}

/// Percentage change of `new_cases_smoothed` over `window` rows per location.
pub fn growth(rows: &[Observation], window: usize) -> Vec<f64> {
    LocationIndex::build(rows).pct_change(rows, window, |o| o.new_cases_smoothed)
}

/// Population bucket of every row, in input order.
pub fn bucket_population(rows: &[Observation]) -> Vec<Option<CountrySize>> {
    rows.iter()
        .map(|row| CountrySize::from_population(row.population))
        .collect()
}

/// Ratio as a whole-number percentage: `0.0734` -> `"7%"`.
pub fn format_percentage(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

/// Formatted weekly growth of every row, in input order.
pub fn format_growth_7d(growth_7d: &[f64]) -> Vec<String> {
    growth_7d.iter().map(|g| format_percentage(*g)).collect()
}

/// Run every derived-column computation over the raw table.
///
/// Output has one row per input row, in input order.
pub fn enrich(rows: &[Observation]) -> Vec<EnrichedObservation> {
    let index = LocationIndex::build(rows);
    let active = index.rolling_sum(rows, ACTIVE_WINDOW, |o| o.new_cases);
    let smoothed = |o: &Observation| o.new_cases_smoothed;
    let growth_1d = index.pct_change(rows, GROWTH_WINDOW_DAY, smoothed);
    let growth_7d = index.pct_change(rows, GROWTH_WINDOW_WEEK, smoothed);
    let growth_30d = index.pct_change(rows, GROWTH_WINDOW_MONTH, smoothed);
    let sizes = bucket_population(rows);

    let enriched: Vec<EnrichedObservation> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| EnrichedObservation {
            observation: row.clone(),
            active_new_week: active[i],
            incident_rate: incidence_rate(active[i], row.population),
            country_size: sizes[i],
            case_growth_1d: growth_1d[i],
            case_growth_7d: growth_7d[i],
            case_growth_30d: growth_30d[i],
            case_growth_7d_formatted: format_percentage(growth_7d[i]),
        })
        .collect();
    debug!(
        "enrich: {} rows enriched across {} locations",
        enriched.len(),
        index.len()
    );
    enriched
}
