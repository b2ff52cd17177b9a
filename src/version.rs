//! Toolchain version gate.
//!
//! Version tokens come from `KEY=value` lines in two metadata files:
//! - installed toolchain: `<install_dir>/.version-history`, key `PETALINUX_BASE_VER`
//! - created project: `<project_dir>/.petalinux/metadata`, key `PETALINUX_VER`
//!
//! The first match wins and surrounding quotes are stripped. Tokens are
//! compared as exact strings; there is no ordering between versions.

use crate::error::VersionError;
use crate::models::{Version, EXIT_FAILURE, EXIT_SUCCESS, EXIT_VERSION_MISMATCH};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

pub const INSTALLED_VERSION_FILE: &str = ".version-history";
pub const INSTALLED_VERSION_KEY: &str = "PETALINUX_BASE_VER";
pub const PROJECT_METADATA_FILE: &str = ".petalinux/metadata";
pub const PROJECT_VERSION_KEY: &str = "PETALINUX_VER";

static INSTALLED_VERSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bPETALINUX_BASE_VER=(\S+)").unwrap());
static PROJECT_VERSION_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bPETALINUX_VER=(\S+)").unwrap());

/// Result of comparing a project's version against the installed toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionCheck {
    Match(Version),
    Mismatch { installed: Version, project: Version },
    /// The project metadata carried no usable version token
    Undeterminable,
}

impl VersionCheck {
    /// Exit code the project-creation step reports for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            VersionCheck::Match(_) => EXIT_SUCCESS,
            VersionCheck::Mismatch { .. } => EXIT_VERSION_MISMATCH,
            VersionCheck::Undeterminable => EXIT_FAILURE,
        }
    }
}

/// Compare the installed version with the (possibly missing) project version.
pub fn compare(installed: &Version, project: Option<&Version>) -> VersionCheck {
    match project {
        None => VersionCheck::Undeterminable,
        Some(project) if project == installed => VersionCheck::Match(project.clone()),
        Some(project) => VersionCheck::Mismatch {
            installed: installed.clone(),
            project: project.clone(),
        },
    }
}

/// First `KEY=value` token matched by `pattern`, quotes stripped.
fn extract_with(content: &str, pattern: &Regex) -> Option<Version> {
    let captures = pattern.captures(content)?;
    let token = captures.get(1)?.as_str();
    Version::new(token.trim_matches(|c| c == '"' || c == '\''))
}

/// Extract the installed toolchain version from `.version-history` content.
pub fn extract_installed_version(content: &str) -> Option<Version> {
    extract_with(content, &INSTALLED_VERSION_REGEX)
}

/// Extract the project version from `.petalinux/metadata` content.
pub fn extract_project_version(content: &str) -> Option<Version> {
    extract_with(content, &PROJECT_VERSION_REGEX)
}

fn read_source(path: &Path) -> Result<String, VersionError> {
    fs::read_to_string(path).map_err(|source| VersionError::SourceUnreadable {
        path: path.to_path_buf(),
        source,
    })
}

pub fn installed_version_path(install_dir: &Path) -> PathBuf {
    install_dir.join(INSTALLED_VERSION_FILE)
}

pub fn project_metadata_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_METADATA_FILE)
}

/// Read the version of the toolchain installed at `install_dir`.
pub fn read_installed_version(install_dir: &Path) -> Result<Version, VersionError> {
    let path = installed_version_path(install_dir);
    let content = read_source(&path)?;
    extract_installed_version(&content).ok_or(VersionError::Undeterminable {
        path,
        key: INSTALLED_VERSION_KEY,
    })
}

/// Read the version recorded in a created project's metadata.
pub fn read_project_version(project_dir: &Path) -> Result<Version, VersionError> {
    let path = project_metadata_path(project_dir);
    let content = read_source(&path)?;
    extract_project_version(&content).ok_or(VersionError::Undeterminable {
        path,
        key: PROJECT_VERSION_KEY,
    })
}

/// Exact-match precondition between the installed toolchain and a project.
#[derive(Debug, Clone)]
pub struct VersionGate {
    installed: Version,
}

impl VersionGate {
    pub fn new(installed: Version) -> Self {
        VersionGate { installed }
    }

    /// Fails when the installed version cannot be determined; callers treat
    /// that as fatal.
    pub fn from_install_dir(install_dir: &Path) -> Result<Self, VersionError> {
        read_installed_version(install_dir).map(VersionGate::new)
    }

    pub fn installed(&self) -> &Version {
        &self.installed
    }

    /// Check a freshly created project. Unreadable metadata counts as an
    /// undeterminable project version.
    pub fn check_project(&self, project_dir: &Path) -> VersionCheck {
        let project = match read_project_version(project_dir) {
            Ok(version) => {
                log::info!("Initial version of the project = {}", version);
                Some(version)
            }
            Err(e) => {
                log::error!("Could not determine version of the created project: {}", e);
                None
            }
        };

        let check = compare(&self.installed, project.as_ref());
        if let VersionCheck::Mismatch {
            ref installed,
            ref project,
        } = check
        {
            log::error!(
                "Petalinux installed version {} does not match project version {}",
                installed,
                project
            );
        }
        check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn v(token: &str) -> Version {
        Version::new(token).unwrap()
    }

    #[test]
    fn test_compare_three_outcomes() {
        assert_eq!(
            compare(&v("2024.2"), Some(&v("2024.2"))),
            VersionCheck::Match(v("2024.2"))
        );
        assert_eq!(
            compare(&v("2024.2"), Some(&v("2024.1"))),
            VersionCheck::Mismatch {
                installed: v("2024.2"),
                project: v("2024.1"),
            }
        );
        assert_eq!(compare(&v("2024.2"), None), VersionCheck::Undeterminable);
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            VersionCheck::Match(v("1")).exit_code(),
            VersionCheck::Mismatch {
                installed: v("1"),
                project: v("2"),
            }
            .exit_code(),
            VersionCheck::Undeterminable.exit_code(),
        ];
        assert_eq!(codes, [0, 2, 1]);
    }

    #[test]
    fn test_installed_version_quotes_stripped() {
        let content = "# history\nPETALINUX_BASE_VER=\"2024.2\"\nPETALINUX_BASE_VER=\"2023.1\"\n";
        assert_eq!(extract_installed_version(content), Some(v("2024.2")));
    }

    #[test]
    fn test_project_key_does_not_match_base_key() {
        let content = "PETALINUX_BASE_VER=2024.2\n";
        assert_eq!(extract_project_version(content), None);
    }

    #[test]
    fn test_empty_quoted_token_is_undeterminable() {
        assert_eq!(extract_project_version("PETALINUX_VER=\"\"\n"), None);
    }

    #[test]
    fn test_gate_reads_files() {
        let temp = tempfile::tempdir().unwrap();
        let install = temp.path().join("petalinux");
        let project = temp.path().join("proj");
        fs::create_dir_all(&install).unwrap();
        fs::create_dir_all(project.join(".petalinux")).unwrap();
        fs::write(
            installed_version_path(&install),
            "PETALINUX_BASE_VER=\"2024.2\"\n",
        )
        .unwrap();
        fs::write(
            project_metadata_path(&project),
            "PETALINUX_VER=2024.2\nVALIDATE_HW_CHKSUM=1\n",
        )
        .unwrap();

        let gate = VersionGate::from_install_dir(&install).unwrap();
        assert_eq!(gate.installed(), &v("2024.2"));
        assert_eq!(gate.check_project(&project), VersionCheck::Match(v("2024.2")));
    }

    #[test]
    fn test_gate_missing_installed_source_is_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = VersionGate::from_install_dir(temp.path()).unwrap_err();
        assert!(matches!(err, VersionError::SourceUnreadable { .. }));
    }

    #[test]
    fn test_gate_installed_without_key_is_error() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(installed_version_path(temp.path()), "nothing here\n").unwrap();
        let err = VersionGate::from_install_dir(temp.path()).unwrap_err();
        assert!(matches!(
            err,
            VersionError::Undeterminable {
                key: INSTALLED_VERSION_KEY,
                ..
            }
        ));
    }

    #[test]
    fn test_gate_project_without_metadata_is_undeterminable() {
        let temp = tempfile::tempdir().unwrap();
        let gate = VersionGate::new(v("2024.2"));
        assert_eq!(gate.check_project(temp.path()), VersionCheck::Undeterminable);
    }

    proptest! {
        #[test]
        fn prop_first_token_extracted_among_noise(
            token in "[A-Za-z0-9._-]{1,16}",
            other in "[A-Za-z0-9._-]{1,16}",
            quoted in any::<bool>(),
        ) {
            let rendered = if quoted { format!("\"{}\"", token) } else { token.clone() };
            let content = format!(
                "HEADER=1\nPETALINUX_VER={}\nPETALINUX_VER={}\n",
                rendered, other
            );
            prop_assert_eq!(extract_project_version(&content), Version::new(token));
        }
    }
}
