use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used by the OWID CSV: "YYYY-MM-DD"
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Name of the global aggregate row in the OWID table.
pub const WORLD: &str = "World";

/// A single day of data for one location.
///
/// `continent` is `None` for aggregate rows ("World", continents and other
/// OWID rollups); every country row carries its continent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub iso_code: Option<String>,
    pub location: String,
    pub continent: Option<String>,
    pub date: NaiveDate,
    pub population: Option<u64>,
    pub new_cases: Option<f64>,
    pub new_cases_smoothed: Option<f64>,
    pub new_deaths_smoothed: Option<f64>,
    pub total_cases: Option<f64>,
    pub total_deaths: Option<f64>,
    pub total_vaccinations: Option<f64>,
    pub icu_patients: Option<f64>,
    pub reproduction_rate: Option<f64>,
}

impl Observation {
    /// Minimal row with every measure unset.
    pub fn new(location: &str, continent: Option<&str>, date: NaiveDate) -> Self {
        Observation {
            iso_code: None,
            location: location.to_string(),
            continent: continent.map(str::to_string),
            date,
            population: None,
            new_cases: None,
            new_cases_smoothed: None,
            new_deaths_smoothed: None,
            total_cases: None,
            total_deaths: None,
            total_vaccinations: None,
            icu_patients: None,
            reproduction_rate: None,
        }
    }

    /// True for world/continent rollups, identified solely by a null continent.
    pub fn is_aggregate(&self) -> bool {
        self.continent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::Observation;
    use chrono::NaiveDate;

    #[test]
    fn test_aggregate_is_null_continent() {
        let date = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let world = Observation::new("World", None, date);
        let germany = Observation::new("Germany", Some("Europe"), date);
        assert!(world.is_aggregate());
        assert!(!germany.is_aggregate());
    }
}
