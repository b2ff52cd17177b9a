//! Settings file loader.

use super::{Settings, SettingsOverrides};
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the global settings path: ~/.config/petalinux-tales/settings.toml
pub fn get_global_settings_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        ConfigError::ValidationFailed("Cannot determine config directory".to_string())
    })?;

    Ok(config_dir.join("petalinux-tales").join("settings.toml"))
}

/// Validate config path (.toml extension required).
pub fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationFailed(
            "Configuration path cannot be empty".to_string(),
        ));
    }

    match path.extension() {
        Some(ext) if ext == "toml" => Ok(()),
        Some(ext) => Err(ConfigError::ValidationFailed(format!(
            "Configuration file must have .toml extension, got .{}",
            ext.to_string_lossy()
        ))),
        None => Err(ConfigError::ValidationFailed(
            "Configuration file must have .toml extension".to_string(),
        )),
    }
}

/// Load settings from a TOML file. Missing keys keep their defaults.
pub fn load_settings_from_file(path: &Path) -> Result<Settings, ConfigError> {
    validate_config_path(path)?;

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(format!(
                "Configuration file not found at: {}",
                path.display()
            ))
        } else {
            ConfigError::IoError(e)
        }
    })?;

    Ok(toml::from_str(&content)?)
}

/// Layer defaults, the settings file and command-line overrides.
///
/// An explicit `config_path` must exist. Without one the global file is used
/// only when it is present. Also returns the file that was read, if any;
/// this runs before logging is set up, so reporting it is the caller's job.
pub fn resolve_settings(
    config_path: Option<&Path>,
    overrides: SettingsOverrides,
) -> Result<(Settings, Option<PathBuf>), ConfigError> {
    let source = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => get_global_settings_path()
            .ok()
            .filter(|global| global.is_file()),
    };

    let base = match source {
        Some(ref path) => load_settings_from_file(path)?,
        None => Settings::default(),
    };

    Ok((base.apply(overrides), source))
}
