//! Command implementations for the COVID dashboard CLI.
//!
//! Each subcommand loads a local OWID CSV, runs the enrichment pipeline,
//! and writes one of the tables the dashboard shows.

use clap::Subcommand;
use covid_data::view::{Metric, TopN, DEFAULT_HOTSPOT_THRESHOLD};
use covid_owid::country_size::CountrySize;

pub mod output;
pub mod report;

#[derive(Subcommand)]
pub enum Command {
    /// Enrich a raw OWID CSV and write it with the derived columns
    Enrich {
        /// Path to the raw OWID CSV
        #[arg(short, long)]
        input: String,

        /// Output path for the enriched CSV
        #[arg(short, long)]
        output: String,
    },

    /// Latest-day country table with weekly incidence rank
    Latest {
        /// Path to the raw OWID CSV
        #[arg(short, long)]
        input: String,

        /// Population bucket to include (repeatable); defaults to all but "very-small"
        #[arg(short, long = "size", long_help = size_help())]
        sizes: Vec<CountrySize>,

        /// Column to sort by, descending
        #[arg(long, default_value = "new_cases")]
        sort_by: Metric,

        /// Number of countries to keep, or "all"
        #[arg(long, default_value = "10")]
        top: TopN,

        /// Print JSON instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Countries whose weekly incidence is at or above a threshold on the latest day
    Hotspots {
        /// Path to the raw OWID CSV
        #[arg(short, long)]
        input: String,

        /// Population bucket to include (repeatable); defaults to all but "very-small"
        #[arg(short, long = "size", long_help = size_help())]
        sizes: Vec<CountrySize>,

        /// Minimum weekly cases per 100k
        #[arg(short, long, default_value_t = DEFAULT_HOTSPOT_THRESHOLD)]
        threshold: i64,

        /// Print JSON instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Enriched daily history of one location
    Country {
        /// Path to the raw OWID CSV
        #[arg(short, long)]
        input: String,

        /// Location name, e.g. "Singapore" or "World"
        #[arg(short, long)]
        location: String,

        /// Print JSON instead of CSV
        #[arg(long)]
        json: bool,
    },
}

/// Long help for `--size`, listing every bucket with its population range.
pub fn size_help() -> String {
    let buckets: Vec<String> = CountrySize::ALL
        .iter()
        .map(|size| {
            let flag = size.label().to_lowercase().replace(' ', "-");
            format!("  {flag} ({})", size.range_hint())
        })
        .collect();
    format!(
        "Population bucket to include (repeatable); defaults to all but \"very-small\"\n{}",
        buckets.join("\n")
    )
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Enrich { input, output } => report::run_enrich(&input, &output),
        Command::Latest {
            input,
            sizes,
            sort_by,
            top,
            json,
        } => report::run_latest(&input, sizes, sort_by, top, json),
        Command::Hotspots {
            input,
            sizes,
            threshold,
            json,
        } => report::run_hotspots(&input, sizes, threshold, json),
        Command::Country {
            input,
            location,
            json,
        } => report::run_country(&input, &location, json),
    }
}
