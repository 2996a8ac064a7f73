// src/config/model.rs

use log::LevelFilter;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::constants::{DEFAULT_INTERVAL, DEFAULT_MODULE};

/// Top-level runtime config
#[derive(Debug, Default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub reader:  ReaderConfig,
}

/// Raw file layout; every table is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)] pub logging: LoggingConfig,
    #[serde(default)] pub reader:  ReaderStub,
}

/// Mirror of the `[logging]` table
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]                   pub enable: bool,
    #[serde(default)]                   pub file:   Option<String>,
    #[serde(default = "default_level")] pub level:  String,
}
fn default_level() -> String { "WARN".into() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enable: false, file: None, level: default_level() }
    }
}

impl LoggingConfig {
    /// Unknown names fall back to WARN.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_uppercase().as_str() {
            "OFF"   => LevelFilter::Off,
            "ERROR" => LevelFilter::Error,
            "INFO"  => LevelFilter::Info,
            "DEBUG" => LevelFilter::Debug,
            "TRACE" => LevelFilter::Trace,
            _       => LevelFilter::Warn,
        }
    }

    pub fn file_name(&self) -> &str {
        self.file.as_deref().unwrap_or("ecreader.log")
    }
}

/// Holds the raw `[reader]` entries from TOML
#[derive(Debug, Default, Deserialize)]
pub struct ReaderStub {
    #[serde(default)] pub module:   Option<String>,
    #[serde(default)] pub interval: Option<String>,
    #[serde(default)] pub decimal:  bool,
}

/// Fully-typed reader defaults
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub module:   String,
    pub interval: Duration,
    pub decimal:  bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self { module: DEFAULT_MODULE.into(), interval: DEFAULT_INTERVAL, decimal: false }
    }
}

/// All the ways config loading can go wrong
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid duration '{0}': {1}")]
    InvalidDuration(String, #[source] humantime::DurationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
