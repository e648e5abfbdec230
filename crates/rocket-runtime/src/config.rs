//! Host configuration (rocket.toml)
//!
//! Every field is optional. A `rocket.toml` next to the script is picked up
//! automatically; command-line flags override whatever it sets.
//!
//! ```toml
//! [runtime]
//! entry = "main"
//! modules = ["fs", "curses", "Image", "Camera"]
//! package_path = ["lib"]
//!
//! [log]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up next to the script
pub const CONFIG_FILE: &str = "rocket.toml";

/// Errors that can occur during configuration parsing
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid config: {0}")]
    ValidationError(String),
}

/// Parsed rocket.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RocketConfig {
    /// Script execution settings
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

/// `[runtime]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    /// Function called after the script body runs
    #[serde(default = "default_entry")]
    pub entry: String,

    /// Native modules to install
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,

    /// Extra directories searched by `require`, relative to the config file
    #[serde(default)]
    pub package_path: Vec<PathBuf>,
}

/// `[log]` table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_entry() -> String {
    "main".to_string()
}

fn default_modules() -> Vec<String> {
    rocket_stdlib::MODULES.iter().map(|m| m.to_string()).collect()
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            modules: default_modules(),
            package_path: Vec::new(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl RocketConfig {
    /// Parse a config from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Parse a config from a string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: RocketConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config sitting next to `script`, if there is one
    pub fn discover(script: &Path) -> Result<Option<Self>, ConfigError> {
        let dir = match script.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let candidate = dir.join(CONFIG_FILE);
        if !candidate.is_file() {
            return Ok(None);
        }
        tracing::debug!(path = %candidate.display(), "using config file");
        Self::from_file(&candidate).map(Some)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime.entry.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "runtime.entry cannot be empty".to_string(),
            ));
        }
        if let Some(unknown) = self
            .runtime
            .modules
            .iter()
            .find(|m| !rocket_stdlib::is_module(m))
        {
            return Err(ConfigError::ValidationError(format!(
                "unknown module '{}'. Available modules: {}",
                unknown,
                rocket_stdlib::MODULES.join(", ")
            )));
        }
        Ok(())
    }

    fn resolve_paths(&mut self, base: &Path) {
        for dir in &mut self.runtime.package_path {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}
