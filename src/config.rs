// src/config.rs

//! Manages connection driver configuration: loading, env overrides, and validation.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;

/// The environment variable consulted once at process start to override the
/// maximum batch size.
pub const MAX_BATCH_SIZE_ENV: &str = "ZIRCONDB_MAX_BATCH_SIZE";

fn default_max_batch_size() -> usize {
    100
}

/// Process-wide settings for connection drivers. Read once at startup;
/// drivers copy what they need at construction and never re-read.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConnectionConfig {
    /// The maximum number of jobs a single drain pass may execute.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
        }
    }
}

impl ConnectionConfig {
    /// Creates a new `ConnectionConfig` by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        let config: ConnectionConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML from '{path}'"))?;

        config.validate()?;
        Ok(config)
    }

    /// Creates a `ConnectionConfig` from defaults, applying any environment
    /// override.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment variable overrides on top of the current values.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(raw) = env::var(MAX_BATCH_SIZE_ENV) {
            self.max_batch_size = raw.parse().with_context(|| {
                format!("{MAX_BATCH_SIZE_ENV} must be a positive integer, got '{raw}'")
            })?;
        }
        Ok(())
    }

    /// Validates the resolved configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(anyhow!("max_batch_size cannot be 0"));
        }
        Ok(())
    }
}
