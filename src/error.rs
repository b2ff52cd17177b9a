//! Unified error type hierarchy for PetaLinux Tales
//!
//! Provides structured error handling with StepError, SequenceError, VersionError,
//! WorkflowError and ConfigError.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::EXIT_FAILURE;

/// Fatal failures raised from inside a step.
///
/// A step reports ordinary failures as a non-zero exit code. These errors are
/// reserved for conditions the sequence must not continue from.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("Project name is not set, probably it was not created first")]
    ProjectNameUnset,

    #[error("Operator input closed while waiting for: {0}")]
    OperatorInputClosed(String),

    #[error("IO error during step: {0}")]
    Io(#[from] io::Error),
}

/// Step sequencing errors.
#[derive(Error, Debug)]
pub enum SequenceError {
    #[error("Sequence has no steps defined")]
    NoSteps,

    #[error("Step {index} {name} returned exit code {exit_code}")]
    StepFailed {
        index: usize,
        name: String,
        exit_code: i32,
    },

    #[error("Step {index} {name} aborted: {source}")]
    StepAborted {
        index: usize,
        name: String,
        #[source]
        source: StepError,
    },

    #[error("Invalid sequence transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },
}

impl SequenceError {
    /// Index of the step that halted the sequence, if a step did.
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            SequenceError::StepFailed { index, .. } | SequenceError::StepAborted { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }

    /// Process exit code the binary reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            SequenceError::StepFailed { exit_code, .. } => *exit_code,
            _ => EXIT_FAILURE,
        }
    }
}

/// Version metadata errors.
#[derive(Error, Debug)]
pub enum VersionError {
    #[error("Cannot read version source {}: {source}", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No {key}= entry found in {}", .path.display())]
    Undeterminable { path: PathBuf, key: &'static str },
}

/// Workflow construction errors. All of them are fatal preconditions.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("{} does not exist!", .0.display())]
    MissingInput(PathBuf),

    #[error("Could not determine PetaLinux installed version: {0}")]
    Version(#[from] VersionError),

    #[error("PetaLinux tools are not available: {0}")]
    ToolchainUnavailable(String),

    #[error("IO error while preparing workflow: {0}")]
    Io(#[from] io::Error),
}

/// Configuration file parsing and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid TOML in config: {0}")]
    InvalidToml(#[from] toml::de::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_failed_display() {
        let err = SequenceError::StepFailed {
            index: 2,
            name: "build".to_string(),
            exit_code: 1,
        };
        assert_eq!(err.to_string(), "Step 2 build returned exit code 1");
        assert_eq!(err.failed_index(), Some(2));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_step_aborted_maps_to_generic_failure() {
        let err = SequenceError::StepAborted {
            index: 1,
            name: "reconfigure_project_with_xsa".to_string(),
            source: StepError::ProjectNameUnset,
        };
        assert_eq!(err.failed_index(), Some(1));
        assert_eq!(err.exit_code(), EXIT_FAILURE);
        assert!(err.to_string().contains("Project name is not set"));
    }

    #[test]
    fn test_no_steps_has_no_index() {
        assert_eq!(SequenceError::NoSteps.failed_index(), None);
    }

    #[test]
    fn test_version_error_display() {
        let err = VersionError::Undeterminable {
            path: PathBuf::from("/opt/petalinux/.version-history"),
            key: "PETALINUX_BASE_VER",
        };
        assert_eq!(
            err.to_string(),
            "No PETALINUX_BASE_VER= entry found in /opt/petalinux/.version-history"
        );
    }

    #[test]
    fn test_missing_input_display() {
        let err = WorkflowError::MissingInput(PathBuf::from("board.xsa"));
        assert_eq!(err.to_string(), "board.xsa does not exist!");
    }
}
