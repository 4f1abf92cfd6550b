//! covid-cli - Command line tool for the OWID COVID-19 enrichment pipeline.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "covid-cli",
    version,
    about = "COVID-19 case, incidence and growth toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: covid_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    covid_cmd::run(cli.command)
}
