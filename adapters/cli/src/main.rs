#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless Tank Defence session.

mod autopilot;
mod config;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tank_defence_core::{SessionConfig, WELCOME_BANNER};
use tank_defence_session::GameSession;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::autopilot::Autopilot;

#[derive(Parser, Debug)]
#[command(name = "tank-defence")]
#[command(about = "Plays a Tank Defence campaign with a scripted autopilot")]
struct Args {
    /// TOML session configuration; built-in defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the session seed
    #[arg(long)]
    seed: Option<u64>,

    /// Overrides the number of waves in the campaign
    #[arg(long)]
    waves: Option<u32>,

    /// Simulated milliseconds per frame
    #[arg(long, default_value = "16")]
    tick_ms: u64,

    /// Frame budget after which the run stops
    #[arg(long, default_value = "500000")]
    max_ticks: u64,

    /// Log filter directive, e.g. `debug` or `tank_defence_session=debug`
    #[arg(long)]
    log_level: Option<String>,
}

/// Entry point for the Tank Defence command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref())?;

    if args.tick_ms == 0 {
        bail!("--tick-ms must be at least 1");
    }
    let config = session_config(&args)?;
    info!(
        seed = config.seed,
        waves = config.total_waves,
        "session configured"
    );

    println!("{WELCOME_BANNER}");
    let mut session = GameSession::new(config.clone());
    let summary = Autopilot::new(config.width, config.height).run(
        &mut session,
        Duration::from_millis(args.tick_ms),
        args.max_ticks,
    );

    println!("status:        {:?}", summary.status);
    println!(
        "waves cleared: {}/{}",
        summary.waves_cleared, config.total_waves
    );
    println!("cash:          {}", summary.cash);
    println!("lives:         {}", summary.lives);
    println!("towers placed: {}", summary.towers_placed);
    println!("upgrades:      {}", summary.upgrades);
    println!("kills:         {}", summary.kills);
    println!("breaches:      {}", summary.breaches);
    println!("frames:        {}", summary.ticks);
    Ok(())
}

fn init_logging(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter `{directive}`"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn session_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => config::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(waves) = args.waves {
        config.total_waves = waves;
    }
    config::validate(&config)?;
    Ok(config)
}
