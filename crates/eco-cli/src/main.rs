//! Console driver for the island ecosystem simulator.

mod prompt;
mod render;
mod telemetry;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use eco_core::{load_table, InteractionMatrix, SimulationConfig, SpeciesCatalog};
use eco_world::Simulation;
use std::path::PathBuf;
use tokio::signal;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

/// Tick limit for headless runs that set none
const DEFAULT_HEADLESS_TICKS: u64 = 1000;

#[derive(Parser)]
#[command(name = "eco-sim")]
#[command(version)]
#[command(about = "Predator, herbivore and plant simulation on a bounded island grid")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a simulation
    Run(RunArgs),

    /// Print the default configuration as JSON
    PrintConfig,
}

#[derive(Args)]
struct RunArgs {
    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Eat-probability table (CSV)
    #[arg(short, long)]
    table: Option<PathBuf>,

    /// Ask for parameters on the terminal
    #[arg(short, long, conflicts_with = "config")]
    interactive: bool,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Delay between ticks in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Print only the census line each tick
    #[arg(short, long)]
    quiet: bool,

    /// Run without pacing or rendering and print a JSON summary
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    telemetry::init_telemetry(cli.log_json)?;

    match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::PrintConfig => {
            println!("{}", SimulationConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn load_config(args: &RunArgs, catalog: &SpeciesCatalog) -> Result<SimulationConfig> {
    let mut config = if args.interactive {
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        prompt::read_config(&mut stdin.lock(), &mut stdout.lock(), catalog.ids())?
    } else if let Some(path) = &args.config {
        SimulationConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?
    } else {
        SimulationConfig::default()
    };

    if let Some(table) = &args.table {
        config.interaction_table = Some(table.clone());
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.max_ticks.is_some() {
        config.max_ticks = args.max_ticks;
    }
    if let Some(delay) = args.delay_ms {
        config.tick_delay_ms = delay;
    }

    Ok(config)
}

async fn run(args: RunArgs) -> Result<()> {
    let mut catalog = SpeciesCatalog::builtin();
    let config = load_config(&args, &catalog)?;

    if let Some(species) = &config.species {
        catalog = SpeciesCatalog::from_species(species.iter().cloned());
    }

    let matrix = match &config.interaction_table {
        Some(path) => {
            let load = load_table(path, &mut catalog)
                .with_context(|| format!("reading interaction table {}", path.display()))?;
            if !load.diagnostics.is_empty() {
                warn!(skipped = load.diagnostics.len(), "Interaction table loaded with diagnostics");
            }
            load.matrix
        }
        None => {
            warn!("No interaction table configured; animals will only graze");
            InteractionMatrix::new()
        }
    };

    let mut sim = Simulation::from_config(&config, &catalog).context("building island")?;

    if args.headless {
        let summary = sim.run(&matrix, config.max_ticks.unwrap_or(DEFAULT_HEADLESS_TICKS));
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", render::render_frame(sim.grid(), sim.tick()));

    let mut ticker = interval(Duration::from_millis(config.tick_delay_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => break,
        }

        sim.step(&matrix);

        if args.quiet {
            println!("Tick {}: {}", sim.tick(), sim.census());
        } else {
            println!("{}", render::render_frame(sim.grid(), sim.tick()));
        }

        if sim.tick() % 100 == 0 {
            sim.emit_population_metrics();
        }

        if sim.is_extinct() {
            println!("All animals have died out. Simulation finished.");
            break;
        }

        if config.max_ticks.is_some_and(|max| sim.tick() >= max) {
            info!(tick = sim.tick(), "Tick limit reached");
            break;
        }
    }

    let totals = sim.totals();
    info!(
        final_tick = sim.tick(),
        births_total = totals.births,
        deaths_total = totals.deaths,
        prey_eaten_total = totals.prey_eaten,
        plants_eaten_total = totals.plants_eaten,
        "Simulation stopped"
    );

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
