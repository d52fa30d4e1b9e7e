//! Command-line entry point for the predator-prey simulator.

mod report;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ecosim_core::RunConfig;
use ecosim_world::{EcosystemSimulator, LotkaVolterra};
use serde::Serialize;
use std::path::{Path, PathBuf};
use telemetry::LogFormat;
use tracing::info;

#[derive(Parser)]
#[command(name = "ecosim")]
#[command(version)]
#[command(about = "Predator-prey population dynamics: agent-based and Lotka-Volterra")]
struct Cli {
    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    /// Configuration file (JSON); missing fields take defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent-based simulation on a toroidal grid
    Agents {
        /// Side length of the grid
        #[arg(long)]
        grid_size: Option<i32>,

        /// Initial number of prey
        #[arg(long)]
        prey: Option<usize>,

        /// Initial number of predators
        #[arg(long)]
        predators: Option<usize>,

        /// Maximum number of steps
        #[arg(short, long)]
        steps: Option<u64>,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Write the population histories to this JSON file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Integrate the Lotka-Volterra reference model
    Ode {
        /// Number of integration steps
        #[arg(short, long, default_value = "1000")]
        steps: usize,

        /// Prey growth rate
        #[arg(long)]
        birth_rate: Option<f64>,

        /// Predator decline rate
        #[arg(long)]
        death_rate: Option<f64>,

        /// Prey loss per encounter
        #[arg(long)]
        predation_rate: Option<f64>,

        /// Predator gain per encounter
        #[arg(long)]
        efficiency: Option<f64>,

        /// Write the time series to this JSON file
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_telemetry(cli.log_format)?;

    let config = match &cli.config {
        Some(path) => RunConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RunConfig::default(),
    };

    match cli.command {
        Commands::Agents {
            grid_size,
            prey,
            predators,
            steps,
            seed,
            json,
        } => {
            let mut config = config;
            if let Some(grid_size) = grid_size {
                config.ecosystem.grid_size = grid_size;
            }
            if let Some(prey) = prey {
                config.ecosystem.num_prey = prey;
            }
            if let Some(predators) = predators {
                config.ecosystem.num_predators = predators;
            }
            if let Some(steps) = steps {
                config.num_steps = steps;
            }
            if seed.is_some() {
                config.seed = seed;
            }
            run_agents(&config, json.as_deref())
        }
        Commands::Ode {
            steps,
            birth_rate,
            death_rate,
            predation_rate,
            efficiency,
            json,
        } => {
            let mut config = config;
            let lv = &mut config.lotka_volterra;
            if let Some(rate) = birth_rate {
                lv.birth_rate = rate;
            }
            if let Some(rate) = death_rate {
                lv.death_rate = rate;
            }
            if let Some(rate) = predation_rate {
                lv.predation_rate = rate;
            }
            if let Some(rate) = efficiency {
                lv.efficiency = rate;
            }
            run_ode(&config, steps, json.as_deref())
        }
    }
}

fn run_agents(config: &RunConfig, json: Option<&Path>) -> Result<()> {
    config.validate()?;

    let ecosystem = config.ecosystem.clone();
    info!(
        grid_size = ecosystem.grid_size,
        prey = ecosystem.num_prey,
        predators = ecosystem.num_predators,
        seed = ?config.seed,
        "Initializing ecosystem"
    );

    let mut simulator = match config.seed {
        Some(seed) => EcosystemSimulator::with_seed(ecosystem, seed)?,
        None => EcosystemSimulator::new(ecosystem)?,
    };
    simulator.set_progress_interval(config.progress_interval);

    let result = simulator.run(config.num_steps);

    print!(
        "{}",
        report::render_history(
            &result.prey_history,
            &result.predator_history,
            config.report_interval,
            config.bar_width,
        )
    );

    if let Some(path) = json {
        write_json(path, &result)?;
    }

    Ok(())
}

fn run_ode(config: &RunConfig, steps: usize, json: Option<&Path>) -> Result<()> {
    let model = LotkaVolterra::new(config.lotka_volterra.clone())?;
    let series = model.simulate(steps);

    info!(
        samples = series.len(),
        dt = model.config().dt,
        "Lotka-Volterra integration finished"
    );

    print!(
        "{}",
        report::render_time_series(
            &series.time,
            &series.prey,
            &series.predators,
            config.report_interval,
        )
    );

    if let Some(path) = json {
        write_json(path, &series)?;
    }

    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let contents = serde_json::to_string_pretty(value)?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}
