//! PetaLinux Tales
//!
//! Drives the PetaLinux toolchain through two fixed workflows and produces
//! bootable artifacts from a board-support package (BSP) and a hardware
//! description (XSA).
//!
//! The system is organized into functional modules:
//! - **error**: Error types for steps, sequences, version lookups and settings
//! - **models**: Command request/result types and exit-code constants
//! - **log_collector**: `log` backend that echoes to the console and persists to disk
//! - **orchestrator**: Process execution and the fail-fast step sequencer
//! - **version**: Installed vs. project toolchain version gate
//! - **artifacts**: Boot artifact locations and existence probes
//! - **prompt**: Blocking operator prompts
//! - **toolchain**: Command lines for the PetaLinux tools
//! - **workflows**: The image-from-package and create-package workflows
//! - **config**: Settings file loading and command-line overrides

// Core foundational modules
pub mod error;
pub mod models;

// Robust, decoupled logging system
pub mod log_collector;

// Process execution and step sequencing
pub mod orchestrator;

pub mod artifacts;
pub mod config;
pub mod prompt;
pub mod toolchain;
pub mod version;
pub mod workflows;

// Re-export the log crate for macro usage
pub use log;

pub use log_collector::{LogCollector, LogLine};

pub use error::{ConfigError, SequenceError, StepError, VersionError, WorkflowError};

pub use models::{CommandRequest, CommandResult, Version};

pub use orchestrator::{
    run_command, CommandRunner, ProcessExecutor, SequenceReport, SequenceState, Sequencer, Step,
    StepResult,
};

pub use version::{VersionCheck, VersionGate};

pub use prompt::{ConsolePrompt, OperatorPrompt};

pub use config::{Settings, SettingsOverrides};

pub use workflows::{PackageOptions, Workflow, WorkflowContext};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert_eq!(VERSION, "0.1.0");
    }

    #[test]
    fn test_models_reexport() {
        let result = CommandResult::completed(String::new(), String::new(), 0);
        assert!(result.success());
        assert_eq!(VersionCheck::Undeterminable.exit_code(), 1);
    }
}
