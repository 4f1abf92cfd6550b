//! Dashboard views over the enriched table.
//!
//! These are the filtering and ordering steps the dashboard applies before
//! handing rows to its charts and tables. Nothing here renders anything.

use crate::enrich::EnrichedObservation;
use crate::snapshot::{latest_date, latest_snapshot, SnapshotRow};
use chrono::NaiveDate;
use covid_owid::country_size::CountrySize;
use covid_owid::observation::WORLD;
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Countries at or above this weekly incidence are listed as hotspots.
pub const DEFAULT_HOTSPOT_THRESHOLD: i64 = 400;

/// Default number of countries in the comparison charts.
pub const DEFAULT_TOP_N: usize = 10;

/// Rows split by conceptual level.
#[derive(Debug, Clone, Default)]
pub struct LevelSplit {
    /// World and continent rollups (null continent).
    pub aggregates: Vec<EnrichedObservation>,
    pub countries: Vec<EnrichedObservation>,
}

/// Separate aggregate rows from country rows; each side keeps input order.
pub fn split_levels(rows: &[EnrichedObservation]) -> LevelSplit {
    let (aggregates, countries): (Vec<_>, Vec<_>) = rows
        .iter()
        .cloned()
        .partition(EnrichedObservation::is_aggregate);
    LevelSplit {
        aggregates,
        countries,
    }
}

/// Keep rows whose population bucket is selected. Rows without a bucket are dropped.
pub fn filter_by_size(
    rows: &[EnrichedObservation],
    sizes: &[CountrySize],
) -> Vec<EnrichedObservation> {
    rows.iter()
        .filter(|row| row.country_size.is_some_and(|size| sizes.contains(&size)))
        .cloned()
        .collect()
}

/// Distinct aggregate location names in order of first appearance.
pub fn aggregate_names(rows: &[EnrichedObservation]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    rows.iter()
        .filter(|row| row.is_aggregate())
        .filter(|row| seen.insert(row.location().to_string()))
        .map(|row| row.location().to_string())
        .collect()
}

/// Sorted distinct country names.
pub fn country_names(rows: &[EnrichedObservation]) -> Vec<String> {
    rows.iter()
        .filter(|row| !row.is_aggregate())
        .map(|row| row.location().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Date of the most recent row, used for the "last updated" note.
pub fn last_update(rows: &[EnrichedObservation]) -> Option<NaiveDate> {
    latest_date(rows)
}

/// One location's rows in date order.
pub fn location_history(rows: &[EnrichedObservation], location: &str) -> Vec<EnrichedObservation> {
    let mut history: Vec<EnrichedObservation> = rows
        .iter()
        .filter(|row| row.location() == location)
        .cloned()
        .collect();
    history.sort_by_key(|row| row.observation.date);
    history
}

/// Rows for any of the named locations, in input order.
pub fn select_locations(
    rows: &[EnrichedObservation],
    names: &[String],
) -> Vec<EnrichedObservation> {
    rows.iter()
        .filter(|row| names.iter().any(|name| name == row.location()))
        .cloned()
        .collect()
}

/// Snapshot rows at or above `threshold`, highest incidence first.
pub fn hotspots(snapshot: &[SnapshotRow], threshold: i64) -> Vec<SnapshotRow> {
    let mut rows: Vec<SnapshotRow> = snapshot
        .iter()
        .filter(|s| s.row.incident_rate >= threshold)
        .cloned()
        .collect();
    rows.sort_by(|a, b| b.row.incident_rate.cmp(&a.row.incident_rate));
    rows
}

/// Columns the comparison charts can be sorted by.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
pub enum Metric {
    NewCases,
    IncidentRate,
    TotalCases,
    CaseGrowth7d,
    Population,
    TotalDeaths,
    NewDeathsSmoothed,
    TotalVaccinations,
    IcuPatients,
}

impl Metric {
    /// Chart order on the dashboard.
    pub const ALL: [Metric; 9] = [
        Metric::NewCases,
        Metric::IncidentRate,
        Metric::TotalCases,
        Metric::CaseGrowth7d,
        Metric::Population,
        Metric::TotalDeaths,
        Metric::NewDeathsSmoothed,
        Metric::TotalVaccinations,
        Metric::IcuPatients,
    ];

    /// Column name in the enriched table.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::NewCases => "new_cases",
            Metric::IncidentRate => "incident_rate",
            Metric::TotalCases => "total_cases",
            Metric::CaseGrowth7d => "case_growth_7d",
            Metric::Population => "population",
            Metric::TotalDeaths => "total_deaths",
            Metric::NewDeathsSmoothed => "new_deaths_smoothed",
            Metric::TotalVaccinations => "total_vaccinations",
            Metric::IcuPatients => "icu_patients",
        }
    }

    /// Chart title.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::NewCases => "New Cases",
            Metric::IncidentRate => "Weekly Incident Rate",
            Metric::TotalCases => "Total Cases",
            Metric::CaseGrowth7d => "Weekly Case Growth",
            Metric::Population => "Population",
            Metric::TotalDeaths => "Total Deaths",
            Metric::NewDeathsSmoothed => "New Deaths",
            Metric::TotalVaccinations => "Total Vaccinations",
            Metric::IcuPatients => "ICU Patients",
        }
    }

    pub fn value(&self, row: &EnrichedObservation) -> Option<f64> {
        let o = &row.observation;
        match self {
            Metric::NewCases => o.new_cases,
            Metric::IncidentRate => Some(row.incident_rate as f64),
            Metric::TotalCases => o.total_cases,
            Metric::CaseGrowth7d => Some(row.case_growth_7d),
            Metric::Population => o.population.map(|p| p as f64),
            Metric::TotalDeaths => o.total_deaths,
            Metric::NewDeathsSmoothed => o.new_deaths_smoothed,
            Metric::TotalVaccinations => o.total_vaccinations,
            Metric::IcuPatients => o.icu_patients,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Metric::ALL
            .iter()
            .find(|metric| metric.key() == wanted)
            .copied()
            .ok_or_else(|| format!("unknown metric: {s}"))
    }
}

/// How many rows the comparison charts keep.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TopN {
    All,
    Count(usize),
}

impl Default for TopN {
    fn default() -> Self {
        TopN::Count(DEFAULT_TOP_N)
    }
}

impl FromStr for TopN {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(TopN::All);
        }
        s.trim()
            .parse::<usize>()
            .map(TopN::Count)
            .map_err(|_| format!("expected a number or \"all\", got {s}"))
    }
}

/// Descending by `metric`, nulls last, ties in input order; then truncate to `top`.
pub fn rank_by(snapshot: &[SnapshotRow], metric: Metric, top: TopN) -> Vec<SnapshotRow> {
    let mut rows = snapshot.to_vec();
    rows.sort_by(|a, b| match (metric.value(&a.row), metric.value(&b.row)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
    if let TopN::Count(n) = top {
        rows.truncate(n);
    }
    rows
}

/// Direction arrow on a country card.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum Trend {
    Rising,
    Falling,
}

/// Data behind one country details card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryCard {
    pub location: String,
    pub iso_code: Option<String>,
    pub new_cases_smoothed: f64,
    pub weekly_change: f64,
    pub weekly_change_formatted: String,
    pub trend: Trend,
    pub population: Option<u64>,
    pub incident_rate: i64,
}

impl From<&SnapshotRow> for CountryCard {
    fn from(snapshot: &SnapshotRow) -> Self {
        let row = &snapshot.row;
        CountryCard {
            location: row.observation.location.clone(),
            iso_code: row.observation.iso_code.clone(),
            new_cases_smoothed: row.observation.new_cases_smoothed.unwrap_or(0.0),
            weekly_change: row.case_growth_7d,
            weekly_change_formatted: row.case_growth_7d_formatted.clone(),
            trend: if row.case_growth_7d > 0.0 {
                Trend::Rising
            } else {
                Trend::Falling
            },
            population: row.observation.population,
            incident_rate: row.incident_rate,
        }
    }
}

/// Sidebar and sort selections.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewOptions {
    pub sizes: Vec<CountrySize>,
    /// Aggregates plotted in the global development chart.
    pub continents: Vec<String>,
    pub sort_by: Metric,
    pub top: TopN,
    pub hotspot_threshold: i64,
}

impl Default for ViewOptions {
    /// Every size bucket except "Very small", world only, sorted by new cases, top 10.
    fn default() -> Self {
        ViewOptions {
            sizes: CountrySize::ALL
                .iter()
                .copied()
                .filter(|size| *size != CountrySize::VerySmall)
                .collect(),
            continents: vec![WORLD.to_string()],
            sort_by: Metric::NewCases,
            top: TopN::default(),
            hotspot_threshold: DEFAULT_HOTSPOT_THRESHOLD,
        }
    }
}

/// Everything the dashboard page reads, derived from one enriched table.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub aggregates: Vec<EnrichedObservation>,
    pub countries: Vec<EnrichedObservation>,
    /// Aggregate rows for the selected continents.
    pub global: Vec<EnrichedObservation>,
    pub aggregate_names: Vec<String>,
    pub country_names: Vec<String>,
    pub last_update: Option<NaiveDate>,
    /// Latest-day country rows with incidence rank.
    pub latest: Vec<SnapshotRow>,
    pub hotspots: Vec<SnapshotRow>,
    pub ranked: Vec<SnapshotRow>,
}

impl DashboardView {
    /// Apply the size filter, split levels, then build the latest-day tables
    /// from country rows only.
    pub fn build(rows: &[EnrichedObservation], options: &ViewOptions) -> Self {
        let filtered = filter_by_size(rows, &options.sizes);
        let aggregate_names = aggregate_names(&filtered);
        let LevelSplit {
            aggregates,
            countries,
        } = split_levels(&filtered);

        let global = select_locations(&aggregates, &options.continents);
        let latest = latest_snapshot(&countries);
        let hotspots = hotspots(&latest, options.hotspot_threshold);
        let ranked = rank_by(&latest, options.sort_by, options.top);
        debug!(
            "view: {} country rows, {} aggregate rows, {} on latest day",
            countries.len(),
            aggregates.len(),
            latest.len()
        );

        DashboardView {
            last_update: last_update(&countries),
            country_names: country_names(&countries),
            aggregate_names,
            aggregates,
            countries,
            global,
            latest,
            hotspots,
            ranked,
        }
    }

    /// Cards for the selected countries, in snapshot order.
    pub fn cards(&self, names: &[String]) -> Vec<CountryCard> {
        self.latest
            .iter()
            .filter(|s| names.iter().any(|name| name == s.row.location()))
            .map(CountryCard::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::enrich;
    use chrono::Duration;
    use covid_owid::observation::Observation;

    fn rows_for(
        location: &str,
        continent: Option<&str>,
        population: u64,
        daily_cases: f64,
        days: i64,
    ) -> Vec<Observation> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        (0..days)
            .map(|d| {
                let mut row = Observation::new(location, continent, start + Duration::days(d));
                row.population = Some(population);
                row.new_cases = Some(daily_cases);
                row.new_cases_smoothed = Some(daily_cases + d as f64);
                row
            })
            .collect()
    }

    fn sample() -> Vec<EnrichedObservation> {
        let mut rows = rows_for("World", None, 7_900_000_000, 500_000.0, 9);
        rows.extend(rows_for("Asia", None, 4_700_000_000, 300_000.0, 9));
        rows.extend(rows_for("Germany", Some("Europe"), 83_000_000, 100_000.0, 9));
        rows.extend(rows_for("Singapore", Some("Asia"), 5_900_000, 1_000.0, 9));
        rows.extend(rows_for("Iceland", Some("Europe"), 370_000, 2_000.0, 9));
        rows.extend(rows_for("Japan", Some("Asia"), 125_000_000, 1.0, 9));
        enrich(&rows)
    }

    #[test]
    fn test_split_levels() {
        let split = split_levels(&sample());
        assert_eq!(split.aggregates.len(), 18);
        assert_eq!(split.countries.len(), 36);
        assert!(split.aggregates.iter().all(|r| r.observation.continent.is_none()));
        assert!(split.countries.iter().all(|r| r.observation.continent.is_some()));
    }

    #[test]
    fn test_names() {
        let rows = sample();
        assert_eq!(aggregate_names(&rows), vec!["World", "Asia"]);
        assert_eq!(
            country_names(&rows),
            vec!["Germany", "Iceland", "Japan", "Singapore"]
        );
    }

    #[test]
    fn test_filter_by_size() {
        let rows = sample();
        let filtered = filter_by_size(&rows, &[CountrySize::VerySmall]);
        assert_eq!(country_names(&filtered), vec!["Iceland"]);
        assert!(filter_by_size(&rows, &[]).is_empty());
    }

    #[test]
    fn test_location_history_is_date_ordered() {
        let mut rows = sample();
        rows.reverse();
        let history = location_history(&rows, "Germany");
        assert_eq!(history.len(), 9);
        assert!(history
            .windows(2)
            .all(|w| w[0].observation.date < w[1].observation.date));
    }

    #[test]
    fn test_select_locations() {
        let rows = sample();
        let names = vec!["Japan".to_string(), "Germany".to_string()];
        let selected = select_locations(&rows, &names);
        assert_eq!(selected.len(), 18);
        assert_eq!(selected[0].location(), "Germany");
    }

    #[test]
    fn test_hotspots_sorted_desc() {
        let snapshot = latest_snapshot(&split_levels(&sample()).countries);
        let hot = hotspots(&snapshot, DEFAULT_HOTSPOT_THRESHOLD);
        // Iceland 2000*7/370k*100k = 3783, Germany 843, Singapore 118, Japan 0
        let names: Vec<&str> = hot.iter().map(|s| s.row.location()).collect();
        assert_eq!(names, vec!["Iceland", "Germany"]);
    }

    #[test]
    fn test_rank_by_metric_with_nulls_last() {
        let mut snapshot = latest_snapshot(&split_levels(&sample()).countries);
        snapshot[0].row.observation.total_cases = Some(10.0);
        snapshot[1].row.observation.total_cases = Some(30.0);
        let ranked = rank_by(&snapshot, Metric::TotalCases, TopN::All);
        assert_eq!(ranked.len(), 4);
        assert_eq!(ranked[0].row.location(), snapshot[1].row.location());
        assert_eq!(ranked[1].row.location(), snapshot[0].row.location());
        assert!(ranked[2].row.observation.total_cases.is_none());

        let top = rank_by(&snapshot, Metric::IncidentRate, TopN::Count(1));
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].row.location(), "Iceland");
    }

    #[test]
    fn test_parse_metric_and_top() {
        assert_eq!("incident_rate".parse::<Metric>(), Ok(Metric::IncidentRate));
        assert_eq!("case-growth-7d".parse::<Metric>(), Ok(Metric::CaseGrowth7d));
        assert!("deaths".parse::<Metric>().is_err());
        assert_eq!("all".parse::<TopN>(), Ok(TopN::All));
        assert_eq!("25".parse::<TopN>(), Ok(TopN::Count(25)));
        assert!("many".parse::<TopN>().is_err());
    }

    #[test]
    fn test_dashboard_view_defaults() {
        let view = DashboardView::build(&sample(), &ViewOptions::default());
        // Iceland is "Very small" and filtered out by default
        assert_eq!(view.country_names, vec!["Germany", "Japan", "Singapore"]);
        assert_eq!(view.aggregate_names, vec!["World", "Asia"]);
        assert_eq!(view.latest.len(), 3);
        assert_eq!(view.last_update, NaiveDate::from_ymd_opt(2022, 1, 9));
        assert_eq!(view.hotspots.len(), 1);
        assert_eq!(view.ranked[0].row.location(), "Germany");
        assert!(view.aggregates.iter().all(|r| r.is_aggregate()));
        assert_eq!(view.global.len(), 9);
        assert!(view.global.iter().all(|r| r.location() == WORLD));
    }

    #[test]
    fn test_country_cards() {
        let view = DashboardView::build(&sample(), &ViewOptions::default());
        let cards = view.cards(&["Singapore".to_string()]);
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.location, "Singapore");
        assert_eq!(card.new_cases_smoothed, 1008.0);
        // smoothed grows 1001 -> 1008 over the week
        assert_eq!(card.trend, Trend::Rising);
        assert_eq!(card.weekly_change_formatted, "1%");
        assert_eq!(card.incident_rate, 118);
    }
}
