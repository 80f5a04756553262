//! Configuration management for hoist
//!
//! Settings are layered from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Environment Variables
//!
//! Any key can be overridden with `HOIST__<section>__<key>`, e.g.
//! `HOIST__DEFAULT_UPLOADER=github` or `HOIST__HTTP__PROXY=http://127.0.0.1:7890`.
//! `GITHUB_TOKEN` / `HOIST_TOKEN` fill in `uploaders.github.pat`.
//!
//! # Configuration File
//!
//! `--config-file` wins, then `HOIST_CONFIG`, then `config.toml` next to the binary.
//! Per-uploader settings live under `[uploaders.<id>]` and are what adapter
//! definitions see through `$(ext_config.<key>)`.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{AdapterConfig, Config, HttpSettings, adapter_value};
pub use sources::application_dir;
pub use validation::ValidationError;

use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_EXTENSIONS_DIR: &str = "extensions";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation fails.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = sources::load(explicit_path)?;
        config.normalize();
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path, skipping the `.env` and token lookup
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        let mut config = sources::load_from_sources(path)?;
        config.normalize();
        validation::validate(&config)?;
        Ok(config)
    }

    /// Directory scanned for adapter definitions
    pub fn extensions_dir(&self) -> PathBuf {
        self.extensions_dir
            .clone()
            .unwrap_or_else(|| application_dir().join(DEFAULT_EXTENSIONS_DIR))
    }

    fn normalize(&mut self) {
        self.rename = self.rename.trim_matches('/').to_string();
    }
}
