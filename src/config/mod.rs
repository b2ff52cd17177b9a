//! Settings management.
//!
//! Settings come from three layers, later ones winning:
//! 1. built-in defaults
//! 2. a TOML settings file (`--config`, or the global file when present)
//! 3. command-line flags / environment
//!
//! # Module Structure
//!
//! - `loader`: locating, reading and validating settings files

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use loader::{get_global_settings_path, load_settings_from_file, resolve_settings};

pub const DEFAULT_WORK_DIR: &str = "work";
pub const DEFAULT_INSTALL_DIR: &str = "/home/embeddev/petalinux";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Environment override for the toolchain installation directory.
pub const INSTALL_DIR_ENV: &str = "PETALINUX_TALES_INSTALL_DIR";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory where projects are created
    pub work_dir: PathBuf,
    /// PetaLinux installation directory
    pub install_dir: PathBuf,
    /// Where the full/parsed log files go
    pub log_dir: PathBuf,
    /// Echo toolchain output to the terminal in real time
    pub echo_output: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            install_dir: PathBuf::from(DEFAULT_INSTALL_DIR),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            echo_output: true,
        }
    }
}

/// Values given on the command line; `None` keeps the file/default value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub work_dir: Option<PathBuf>,
    pub install_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub quiet: bool,
}

impl Settings {
    pub fn apply(mut self, overrides: SettingsOverrides) -> Self {
        if let Some(work_dir) = overrides.work_dir {
            self.work_dir = work_dir;
        }
        if let Some(install_dir) = overrides.install_dir {
            self.install_dir = install_dir;
        }
        if let Some(log_dir) = overrides.log_dir {
            self.log_dir = log_dir;
        }
        if overrides.quiet {
            self.echo_output = false;
        }
        self
    }
}
