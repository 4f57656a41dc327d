#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Quantum Groove experience.

mod headless;
mod sound;
mod windowed;

use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use quantum_groove_system_arrangement::{MelodyModel, ProceduralVariation};
use quantum_groove_world::SessionConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command-line arguments accepted by the binary.
#[derive(Debug, Parser)]
#[command(name = "quantum-groove", about = "Gesture-driven quantum rhythm generator")]
struct Args {
    /// TOML file with session settings.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Overrides the collapse seed from the configuration.
    #[arg(long)]
    seed: Option<u64>,
    /// Runs a scripted performance without opening a window.
    #[arg(long)]
    headless: bool,
    /// Number of ticks performed in headless mode.
    #[arg(long, default_value_t = 1_800)]
    ticks: u64,
    /// Length of a headless tick in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,
    /// Log filter directive, e.g. `debug` or `quantum_groove_world=trace`.
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
    /// Disables vertical sync in windowed mode.
    #[arg(long)]
    no_vsync: bool,
    /// Logs the frame rate once per second in windowed mode.
    #[arg(long)]
    show_fps: bool,
}

/// Entry point for the Quantum Groove command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    install_logging(args.log.as_deref())?;

    let config = load_config(&args)?;
    let melody = melody_model(&config);

    if args.headless {
        let summary = headless::run(
            config,
            melody,
            args.ticks,
            Duration::from_millis(args.tick_ms),
        );
        println!("{summary}");
        return Ok(());
    }

    windowed::run(
        config,
        melody,
        windowed::WindowOptions {
            vsync: !args.no_vsync,
            show_fps: args.show_fps,
        },
    )
}

fn install_logging(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter `{directive}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!(error))
        .context("failed to install the log subscriber")
}

fn load_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            SessionConfig::from_toml_str(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.rng_seed = seed;
    }
    info!(
        seed = config.rng_seed,
        generative_melody = config.generative_melody,
        "configuration loaded"
    );
    Ok(config)
}

fn melody_model(config: &SessionConfig) -> Option<Arc<dyn MelodyModel>> {
    if !config.generative_melody {
        return None;
    }
    let model: Arc<dyn MelodyModel> = Arc::new(ProceduralVariation::new(config.rng_seed));
    Some(model)
}
