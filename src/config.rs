//! Configuration System
//!
//! TOML configuration merged from defaults, the global config file, an optional explicit
//! file and `PREFIX_PROBE__*` environment variables. Tests included.

use crate::discovery::DiscoveryConfig;
use crate::error::ProbeError;
use crate::logging::LoggingConfig;
use crate::oracle::HttpOracleConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

mod sources;

pub use sources::{global_config_path, ENV_PREFIX};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Search settings
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// HTTP oracle settings
    #[serde(default)]
    pub oracle: HttpOracleConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Discovery(String),
    Oracle(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Discovery(msg) => write!(f, "discovery: {}", msg),
            ValidationError::Oracle(msg) => write!(f, "oracle: {}", msg),
            ValidationError::Logging(msg) => write!(f, "logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ProbeConfig {
    /// Validate the configuration. The oracle section is only checked when it will be used.
    pub fn validate(&self, require_oracle: bool) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.discovery.validate() {
            errors.push(ValidationError::Discovery(e));
        }
        if require_oracle {
            if let Err(e) = self.oracle.validate() {
                errors.push(ValidationError::Oracle(e));
            }
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String, ProbeError> {
        toml::to_string_pretty(self)
            .map_err(|e| ProbeError::ConfigError(format!("Failed to render configuration: {}", e)))
    }
}

/// Loads [`ProbeConfig`] from the standard sources.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults, global file, then environment.
    pub fn load() -> Result<ProbeConfig, ProbeError> {
        Self::load_with(None)
    }

    /// Defaults, global file, `path`, then environment.
    pub fn load_from_file(path: &Path) -> Result<ProbeConfig, ProbeError> {
        Self::load_with(Some(path))
    }

    /// Built-in defaults only.
    pub fn defaults() -> Result<ProbeConfig, ProbeError> {
        let config = sources::builder_with_defaults()?.build()?;
        Ok(config.try_deserialize()?)
    }

    fn load_with(path: Option<&Path>) -> Result<ProbeConfig, ProbeError> {
        let mut builder = sources::add_global_file(sources::builder_with_defaults()?);
        if let Some(path) = path {
            builder = sources::add_explicit_file(builder, path);
        }
        builder = sources::add_environment(builder);

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
