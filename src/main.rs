use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use aegis_sim::config::{self, Config};
use aegis_sim::error;
use aegis_sim::observer::{self, AnimationObserver, ObserverRegistry, PlotObserver, RunOutcome};
use aegis_sim::simulation::Simulation;

/// Discrete-time, multi-agent pursuit-evasion flight simulator.
#[derive(Parser, Debug)]
#[command(name = "aegis-sim", version, about)]
struct Cli {
    /// Path to a JSON config file; overrides the built-in defaults where present.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable the live terminal dashboard.
    #[arg(long)]
    no_dashboard: bool,

    /// Disable writing the trajectory plot and animation to disk.
    #[arg(long)]
    no_output: bool,

    /// Disable the bounded-channel visualiser bridge.
    #[arg(long)]
    no_visualiser: bool,

    /// Stop after this many ticks even if no capture occurs.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Randomise initial conditions instead of using the built-in scenario.
    #[arg(long)]
    randomise: bool,

    /// Directory to write plot/animation output into.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<Config, error::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if cli.no_dashboard {
        config.output.dashboard_enabled = false;
    }
    if cli.no_output {
        config.output.output_enabled = false;
    }
    if cli.no_visualiser {
        config.output.visualiser_enabled = false;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.output_directory = dir.to_string_lossy().into_owned();
    }
    if cli.randomise {
        config.initial_conditions = Some(randomised_initial_conditions(&config.simulation));
    }

    config.validate()?;
    Ok(config)
}

/// Scatters agents randomly within the configured volume with random heading,
/// used for `--randomise` runs instead of the fixed head-on scenario.
fn randomised_initial_conditions(simulation: &config::SimulationConfig) -> config::InitialConditions {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let n = simulation.agents;

    let mut positions = Vec::with_capacity(n);
    let mut azimuth_angles = Vec::with_capacity(n);
    for _ in 0..n {
        positions.push([
            rng.gen_range(0.0..simulation.width),
            rng.gen_range(0.0..simulation.length),
            rng.gen_range(simulation.hard_deck..simulation.height),
        ]);
        azimuth_angles.push(rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI));
    }

    config::InitialConditions {
        positions,
        speeds: vec![250.0; n],
        attack_angles: vec![0.0; n],
        flight_path_angles: vec![0.0; n],
        roll_angles: vec![0.0; n],
        azimuth_angles,
    }
}

fn build_observers(config: &Config, agents: usize) -> Result<(ObserverRegistry, bool), std::io::Error> {
    let mut registry = ObserverRegistry::new();

    let mut dashboard_enabled = false;
    if config.output.dashboard_enabled {
        crossterm::terminal::enable_raw_mode()?;
        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;
        registry.register(Box::new(observer::DashboardObserver::new(terminal)));
        dashboard_enabled = true;
    }

    if config.output.output_enabled {
        let output_dir = PathBuf::from(&config.output.output_directory);
        std::fs::create_dir_all(&output_dir)?;
        registry.register(Box::new(PlotObserver::new(
            output_dir.join(&config.output.plot_filename),
            agents,
        )));
        registry.register(Box::new(AnimationObserver::new(
            output_dir.join(&config.output.animation_filename),
            agents,
            10,
        )));
    }

    if config.output.visualiser_enabled {
        let (channel_observer, _receiver) = observer::ChannelObserver::new(256);
        // The receiving half is for an out-of-process consumer; this binary does
        // not ship one, so it is dropped here and the bridge degrades to a no-op
        // once the receiver disconnects (see ChannelObserver::send).
        registry.register(Box::new(channel_observer));
    }

    Ok((registry, dashboard_enabled))
}

fn install_interrupt_handler() -> Arc<AtomicBool> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    if let Err(error) = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    }) {
        tracing::warn!(%error, "failed to install interrupt handler, Ctrl-C will terminate the process immediately");
    }
    interrupted
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "invalid configuration");
            return std::process::ExitCode::FAILURE;
        }
    };

    let mut simulation = match Simulation::new(config.clone()) {
        Ok(simulation) => simulation,
        Err(error) => {
            tracing::error!(%error, "failed to construct simulation");
            return std::process::ExitCode::FAILURE;
        }
    };

    let agents = simulation.agents();
    let (mut registry, dashboard_enabled) = match build_observers(&config, agents) {
        Ok(built) => built,
        Err(error) => {
            tracing::error!(%error, "failed to set up observers");
            return std::process::ExitCode::FAILURE;
        }
    };

    let interrupted = install_interrupt_handler();

    let outcome = simulation.run(&mut registry, cli.max_ticks, &interrupted);

    if dashboard_enabled {
        let _ = crossterm::terminal::disable_raw_mode();
    }

    match outcome {
        RunOutcome::Captured(evader) => tracing::info!(evader, tick = simulation.tick(), "run complete: capture"),
        RunOutcome::TickLimitReached => tracing::info!(tick = simulation.tick(), "run complete: tick limit"),
        RunOutcome::Interrupted => tracing::info!(tick = simulation.tick(), "run complete: interrupted"),
    }

    std::process::ExitCode::SUCCESS
}
