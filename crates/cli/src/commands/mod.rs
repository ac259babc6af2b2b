pub mod ask;
pub mod config_cmd;
pub mod doctor;
pub mod layers;

use std::path::{Path, PathBuf};
use strata_config::{AppConfig, ConfigError};

/// The file `--config` points at, else `~/.strata/config.toml`.
pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Load, apply process environment overrides, validate.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    AppConfig::load_with_env(&config_path(explicit), |key| std::env::var(key).ok())
}
