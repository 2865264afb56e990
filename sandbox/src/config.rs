use std::path::{Path, PathBuf};

use engine::SimOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SPAWN_INTERVAL: f32 = 120.0;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("failed to read config file: {0}")]
  Read(#[from] std::io::Error),

  #[error("failed to parse config file: {0}")]
  Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub simulation: SimulationConfig,
  pub logging: LoggingConfig,
}

impl Config {
  pub fn from_path<T>(path: T) -> Result<Self, ConfigError>
  where
    T: AsRef<Path>,
  {
    let config = std::fs::read_to_string(path)?;
    Self::from_toml(&config)
  }

  pub fn from_toml(config: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(config)?)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
  pub options: SimOptions,
  pub seed: Option<u64>,
  pub tick_rate: Option<usize>,
  /// Seconds of simulation time between spawns.
  pub spawn_interval: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
  pub level: Option<String>,
  /// Where to keep a daily log file, if anywhere.
  pub directory: Option<PathBuf>,
}
