//! Compiler configuration, loaded from an optional ~/.scenescript/config.yaml.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Duration, in seconds, of a command without a `duration` option.
pub const DEFAULT_DURATION: f64 = 0.5;

/// Maximum iterations a single loop may run.
pub const DEFAULT_MAX_ITERATIONS: u64 = 100_000;

/// Tunable defaults and limits for scene compilation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CompilerConfig {
    /// Seconds a command lasts when it has no `duration` option.
    #[serde(default = "default_duration")]
    pub default_duration: f64,
    /// Total `for` and `while` iterations one compilation may run, summed
    /// over every loop in the scene.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    /// Emit an unnumbered marker command where each parallel block ends.
    #[serde(default = "default_true")]
    pub parallel_markers: bool,
}

fn default_duration() -> f64 {
    DEFAULT_DURATION
}

fn default_max_iterations() -> u64 {
    DEFAULT_MAX_ITERATIONS
}

fn default_true() -> bool {
    true
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            default_duration: DEFAULT_DURATION,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            parallel_markers: true,
        }
    }
}

/// Settings that would produce an invalid timeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("default_duration must be a non-negative number of seconds, got {0}")]
    InvalidDefaultDuration(f64),
    #[error("max_iterations must be at least 1")]
    ZeroIterationLimit,
}

impl CompilerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_duration.is_finite() || self.default_duration < 0.0 {
            return Err(ConfigError::InvalidDefaultDuration(self.default_duration));
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::ZeroIterationLimit);
        }
        Ok(())
    }
}

/// Default path for the configuration file.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".scenescript");
    path.push("config.yaml");
    path
}

/// Load configuration from a YAML file. Returns defaults if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<CompilerConfig, io::Error> {
    if !path.exists() {
        return Ok(CompilerConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    let config: CompilerConfig = serde_yaml::from_str(&content)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    config
        .validate()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(config)
}

/// Save configuration to a YAML file, creating parent directories as needed.
pub fn save_config(path: &Path, config: &CompilerConfig) -> Result<(), io::Error> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(config).map_err(io::Error::other)?;
    std::fs::write(path, yaml)
}
