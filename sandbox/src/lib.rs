use std::path::PathBuf;

use clap::Parser;

pub mod airport;
pub mod config;
pub mod logging;
pub mod runner;

#[derive(Parser, Debug)]
#[command(about = "Tower simulator driven from the terminal")]
pub struct Cli {
  /// The path to the config file.
  #[arg(short, long, default_value = None)]
  pub config_path: Option<PathBuf>,

  /// The seed to use for the random number generator.
  #[arg(short, long)]
  pub seed: Option<u64>,

  /// Simulation ticks per second.
  #[arg(short, long)]
  pub tick_rate: Option<usize>,

  /// Log filter, e.g. "info" or "engine=debug".
  #[arg(short, long)]
  pub log_level: Option<String>,
}
