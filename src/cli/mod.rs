pub mod decode;
pub mod run;
#[cfg(test)]
mod run_test;

use std::{error::Error, path::PathBuf};

use clap::{Parser, Subcommand};
use ds4_driver::{
    config::{path::get_config_path, DriverConfig},
    messages::status::{BatteryState, Joy, Status},
};
use serde::Serialize;

use decode::handle_decode;
use run::handle_run;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the driver config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the schedule and the configured controller (default)
    Run,
    /// Run the schedule without opening a controller
    Schedule,
    /// Decode a file of recorded input reports
    Decode {
        /// File containing back to back input reports
        path: PathBuf,
        /// Reports are raw Bluetooth reports instead of USB reports
        #[arg(long)]
        bluetooth: bool,
    },
}

/// A message written to stdout as a single JSON line
#[derive(Debug, Serialize)]
#[serde(tag = "topic", content = "message", rename_all = "snake_case")]
pub enum Output {
    Status(Status),
    Joy(Joy),
    Battery(BatteryState),
}

impl Output {
    pub fn print(&self) -> Result<(), serde_json::Error> {
        println!("{}", serde_json::to_string(self)?);
        Ok(())
    }
}

pub async fn main_cli(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = load_config(args.config)?;
    log::debug!("Using config: {config:?}");

    match args.cmd.unwrap_or(Commands::Run) {
        Commands::Run => handle_run(config, true).await?,
        Commands::Schedule => handle_run(config, false).await?,
        Commands::Decode { path, bluetooth } => handle_decode(&config, &path, bluetooth)?,
    }

    Ok(())
}

/// Load the config at the given path, or from the first config file found
/// in the default locations. Falls back to the built-in defaults.
fn load_config(path: Option<PathBuf>) -> Result<DriverConfig, Box<dyn Error + Send + Sync>> {
    if let Some(path) = path {
        log::info!("Loading config from {path:?}");
        return Ok(DriverConfig::from_yaml_file(path)?);
    }
    let Some(path) = get_config_path() else {
        log::warn!("No config file found. Using defaults.");
        return Ok(DriverConfig::default());
    };
    log::info!("Loading config from {path:?}");
    Ok(DriverConfig::from_yaml_file(path)?)
}
