use anyhow::{Context, Result};
use clap::Parser;

use nbody_playground::app;
use nbody_playground::config::{Args, SimulationConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = SimulationConfig::from_args(&args).context("loading configuration")?;
    log::debug!("{config:?}");

    app::run(&config)
}
