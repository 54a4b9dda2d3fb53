//! Configuration sources, lowest to highest precedence:
//! built-in defaults, global file, explicit file, environment.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Prefix for environment overrides, e.g. `PREFIX_PROBE__DISCOVERY__WORKERS=8`.
pub const ENV_PREFIX: &str = "PREFIX_PROBE";
const ENV_SEPARATOR: &str = "__";

/// Builder with defaults for keys that have no serde default worth relying on.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("discovery.workers", 4)?
        .set_default("discovery.root", "")?
        .set_default("discovery.branch_complete", true)?
        .set_default("logging.level", "warn")
}

/// `$XDG_CONFIG_HOME/prefix-probe/config.toml`, else `~/.config/prefix-probe/config.toml`.
pub fn global_config_path() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("prefix-probe").join("config.toml"))
}

/// Add the global config file if it exists.
pub fn add_global_file(
    builder: ConfigBuilder<DefaultState>,
) -> ConfigBuilder<DefaultState> {
    match global_config_path() {
        Some(path) if path.exists() => {
            debug!(config_path = %path.display(), "Loading global configuration");
            builder.add_source(File::from(path).format(FileFormat::Toml).required(false))
        }
        _ => builder,
    }
}

/// Add an explicitly requested config file. Missing files are an error.
pub fn add_explicit_file(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> ConfigBuilder<DefaultState> {
    debug!(config_path = %path.display(), "Loading configuration file");
    builder.add_source(File::from(path).format(FileFormat::Toml).required(true))
}

/// Add `PREFIX_PROBE__SECTION__KEY` environment overrides.
///
/// Values stay strings until deserialization, so `007` reaches a string field intact
/// while numeric and boolean fields still convert.
pub fn add_environment(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR),
    )
}
