use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use planet_weather::{
    engine::{SimulationRunner, SimulationSettings},
    scenario::{Scenario, ScenarioLoader},
    store::FileStore,
    web::{self, WebServerConfig},
    world::OrbitalSystem,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Three-planet weather forecaster")]
struct Cli {
    /// Directory holding the stored records and totals
    #[arg(long, global = true, env = "WEATHER_STORE_DIR", default_value = "weather-data")]
    store_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify every day of the horizon and store the results
    Simulate {
        /// Path to a scenario YAML file (built-in defaults when omitted)
        #[arg(long)]
        scenario: Option<PathBuf>,

        /// Override the scenario horizon in days
        #[arg(long)]
        days: Option<u32>,

        /// Count weather days without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Serve stored results over HTTP
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Simulate {
            scenario,
            days,
            dry_run,
        } => simulate(&cli.store_dir, scenario, days, dry_run),
        Command::Serve { host, port } => serve(&cli.store_dir, host, port),
    }
}

fn simulate(
    store_dir: &Path,
    scenario_path: Option<PathBuf>,
    days: Option<u32>,
    dry_run: bool,
) -> Result<()> {
    let scenario = match scenario_path {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::default(),
    };
    let horizon = scenario.horizon(days);

    // A dry run must not wipe the results of the previous run.
    let opened = if dry_run {
        FileStore::open(store_dir)
    } else {
        FileStore::create(store_dir)
    };
    let store =
        opened.with_context(|| format!("Could not open store at {}", store_dir.display()))?;

    let settings = SimulationSettings::from_scenario(&scenario).with_dry_run(dry_run);
    let mut runner = SimulationRunner::new(OrbitalSystem::from_scenario(&scenario), store, settings);
    let counter = runner.run(horizon)?;

    println!(
        "Scenario '{}' completed for {} days: {} drought, {} optimum, {} rain, {} other",
        scenario.name,
        counter.days,
        counter.drought,
        counter.optimum_temperature_pressure,
        counter.rain_season,
        counter.other
    );
    Ok(())
}

fn serve(store_dir: &Path, host: String, port: u16) -> Result<()> {
    let store = FileStore::open(store_dir)
        .with_context(|| format!("Could not open store at {}", store_dir.display()))?;
    let config = WebServerConfig {
        store: Arc::new(store),
        host,
        port,
    };

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(web::run(config))
}
