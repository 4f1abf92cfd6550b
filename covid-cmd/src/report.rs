//! Subcommand bodies: load, enrich, select, write.

use crate::output::{write_enriched_csv, write_json, write_snapshot_csv};
use anyhow::Context;
use covid_data::enrich::{enrich, EnrichedObservation};
use covid_data::view::{location_history, DashboardView, Metric, TopN, ViewOptions};
use covid_owid::country_size::CountrySize;
use covid_owid::loader::load_observations_from_path;
use log::{info, warn};
use std::fs::File;
use std::io::{self, BufWriter};

/// Load the raw table from disk and run the enrichment pipeline.
pub fn load_enriched(input: &str) -> anyhow::Result<Vec<EnrichedObservation>> {
    let observations = load_observations_from_path(input)
        .with_context(|| format!("failed to load observations from {input}"))?;
    Ok(enrich(&observations))
}

pub fn run_enrich(input: &str, output: &str) -> anyhow::Result<()> {
    let enriched = load_enriched(input)?;
    let file = File::create(output).with_context(|| format!("failed to create {output}"))?;
    write_enriched_csv(&enriched, BufWriter::new(file))?;
    info!("Enrich complete. {} rows written to {}", enriched.len(), output);
    Ok(())
}

/// Options for the latest-day table; an empty size list keeps the dashboard default.
pub fn latest_options(sizes: Vec<CountrySize>, sort_by: Metric, top: TopN) -> ViewOptions {
    let defaults = ViewOptions::default();
    ViewOptions {
        sizes: if sizes.is_empty() { defaults.sizes } else { sizes },
        sort_by,
        top,
        ..defaults
    }
}

pub fn run_latest(
    input: &str,
    sizes: Vec<CountrySize>,
    sort_by: Metric,
    top: TopN,
    json: bool,
) -> anyhow::Result<()> {
    let enriched = load_enriched(input)?;
    let options = latest_options(sizes, sort_by, top);
    let view = DashboardView::build(&enriched, &options);
    match view.last_update {
        Some(date) => info!("Data last updated on {}", date.format("%d %b %Y")),
        None => warn!("No country rows left after filtering"),
    }
    info!("Sorted by {} ({})", options.sort_by.label(), options.sort_by);

    let stdout = io::stdout();
    if json {
        write_json(&view.ranked, stdout.lock())
    } else {
        write_snapshot_csv(&view.ranked, stdout.lock())
    }
}

/// Options for the hotspot table; same size default as the latest-day table.
pub fn hotspot_options(sizes: Vec<CountrySize>, threshold: i64) -> ViewOptions {
    ViewOptions {
        hotspot_threshold: threshold,
        ..latest_options(sizes, Metric::IncidentRate, TopN::All)
    }
}

pub fn run_hotspots(
    input: &str,
    sizes: Vec<CountrySize>,
    threshold: i64,
    json: bool,
) -> anyhow::Result<()> {
    let enriched = load_enriched(input)?;
    let options = hotspot_options(sizes, threshold);
    let view = DashboardView::build(&enriched, &options);
    info!(
        "{} countries with incident rate over {}",
        view.hotspots.len(),
        threshold
    );

    let stdout = io::stdout();
    if json {
        write_json(&view.hotspots, stdout.lock())
    } else {
        write_snapshot_csv(&view.hotspots, stdout.lock())
    }
}

pub fn run_country(input: &str, location: &str, json: bool) -> anyhow::Result<()> {
    let enriched = load_enriched(input)?;
    let history = location_history(&enriched, location);
    if history.is_empty() {
        anyhow::bail!("no observations for location {location:?}");
    }

    let stdout = io::stdout();
    if json {
        write_json(&history, stdout.lock())
    } else {
        write_enriched_csv(&history, stdout.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
iso_code,continent,location,date,population,new_cases,new_cases_smoothed
SGP,Asia,Singapore,2022-02-01,5900000,5900,5000
SGP,Asia,Singapore,2022-02-02,5900000,5900,5500
OWID_WRL,,World,2022-02-01,7900000000,1000000,900000
OWID_WRL,,World,2022-02-02,7900000000,1000000,950000
";

    fn fixture(name: &str, contents: &str) -> String {
        let path = std::env::temp_dir().join(format!("covid-cmd-{}-{name}", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_latest_options_defaults() {
        let options = latest_options(Vec::new(), Metric::IncidentRate, TopN::All);
        assert_eq!(options.sizes, ViewOptions::default().sizes);
        assert_eq!(options.sort_by, Metric::IncidentRate);
        assert_eq!(options.top, TopN::All);

        let options = latest_options(vec![CountrySize::Small], Metric::NewCases, TopN::Count(5));
        assert_eq!(options.sizes, vec![CountrySize::Small]);
    }

    #[test]
    fn test_hotspots_follow_size_filter() {
        let csv = "\
iso_code,continent,location,date,population,new_cases,new_cases_smoothed
SGP,Asia,Singapore,2022-02-01,5900000,5900,5000
TUV,Oceania,Tuvalu,2022-02-01,11000,100,90
";
        let enriched = load_enriched(&fixture("hotspots.csv", csv)).unwrap();

        // Tuvalu: 100 / 11000 * 100k = 909, but "Very small" is off by default
        let view = DashboardView::build(&enriched, &hotspot_options(Vec::new(), 400));
        assert!(view.hotspots.is_empty());

        let options = hotspot_options(vec![CountrySize::VerySmall], 400);
        let view = DashboardView::build(&enriched, &options);
        assert_eq!(view.hotspots.len(), 1);
        assert_eq!(view.hotspots[0].row.location(), "Tuvalu");
        assert_eq!(view.hotspots[0].row.incident_rate, 909);
    }

    #[test]
    fn test_run_enrich_writes_csv() {
        let input = fixture("raw.csv", CSV);
        let output = fixture("enriched.csv", "");
        run_enrich(&input, &output).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert_eq!(written.lines().count(), 5);
        assert!(written.lines().nth(2).unwrap().contains("Singapore,2022-02-02"));
        // 1d growth 5000 -> 5500, too short for 7d and 30d
        assert!(written.lines().nth(2).unwrap().ends_with(",0.1,0,0,0%,false"));
    }

    #[test]
    fn test_load_enriched_missing_file() {
        let err = load_enriched("/nonexistent/owid.csv").unwrap_err();
        assert!(err.to_string().contains("failed to load observations"));
    }

    #[test]
    fn test_load_enriched_missing_columns() {
        let input = fixture("bad.csv", "location,date\nSingapore,2022-02-01\n");
        let err = load_enriched(&input).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("missing required columns"), "{message}");
    }

    #[test]
    fn test_run_country_unknown_location() {
        let input = fixture("country.csv", CSV);
        assert!(run_country(&input, "Atlantis", false).is_err());
    }
}
