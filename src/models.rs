//! Core data structures shared by the executor, the sequencer and the workflows.

use serde::{Deserialize, Serialize};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

/// Exit code the shell convention reserves for "command not found".
pub const COMMAND_NOT_FOUND_EXIT_CODE: i32 = 127;

/// Text that marks a not-found condition in captured stderr (compared lowercase).
pub const COMMAND_NOT_FOUND_INDICATOR: &str = "command not found";

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Exit code of the project-creation step when the project and toolchain versions differ.
pub const EXIT_VERSION_MISMATCH: i32 = 2;

/// One external command invocation: an explicit argument vector, never a shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    /// Program followed by its arguments, passed to the OS byte for byte
    pub argv: Vec<OsString>,
    /// Directory the process runs in (inherits ours when `None`)
    pub current_dir: Option<PathBuf>,
    /// Text written to the process' stdin before it is closed.
    /// When `None` stdin is inherited from the operator's terminal.
    pub stdin_input: Option<String>,
}

impl CommandRequest {
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        CommandRequest {
            argv: argv.into_iter().map(Into::into).collect(),
            current_dir: None,
            stdin_input: None,
        }
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn stdin_input(mut self, text: impl Into<String>) -> Self {
        self.stdin_input = Some(text.into());
        self
    }

    /// The executable name, if the argument vector is not empty and valid UTF-8.
    pub fn program(&self) -> Option<&str> {
        self.argv.first().and_then(|arg| arg.to_str())
    }

    /// Argument at `index` as UTF-8, `None` when absent or not valid UTF-8.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.argv.get(index).and_then(|arg| arg.to_str())
    }

    /// Value following `flag` in the argument vector.
    pub fn value_of(&self, flag: &str) -> Option<&OsStr> {
        self.argv
            .iter()
            .position(|arg| arg == flag)
            .and_then(|i| self.argv.get(i + 1))
            .map(OsString::as_os_str)
    }

    /// Human-readable command line for logs. Arguments containing whitespace
    /// are quoted; non-UTF-8 bytes are shown lossily.
    pub fn display_line(&self) -> String {
        self.argv
            .iter()
            .map(|arg| {
                let arg = arg.to_string_lossy();
                if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                    format!("\"{}\"", arg)
                } else {
                    arg.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Outcome of one external command. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub command_not_found: bool,
}

impl CommandResult {
    /// Build the result of a process that actually ran, classifying not-found.
    pub fn completed(stdout: String, stderr: String, exit_code: i32) -> Self {
        let command_not_found = is_command_not_found(exit_code, &stderr);
        CommandResult {
            stdout,
            stderr,
            exit_code,
            command_not_found,
        }
    }

    /// Synthetic result for an executable that could not be spawned at all.
    pub fn not_found() -> Self {
        CommandResult {
            stdout: String::new(),
            stderr: "Command not found".to_string(),
            exit_code: COMMAND_NOT_FOUND_EXIT_CODE,
            command_not_found: true,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == EXIT_SUCCESS
    }
}

/// Not-found classification: sentinel exit code or the indicator text in stderr.
pub fn is_command_not_found(exit_code: i32, stderr: &str) -> bool {
    exit_code == COMMAND_NOT_FOUND_EXIT_CODE
        || stderr.to_lowercase().contains(COMMAND_NOT_FOUND_INDICATOR)
}

/// Opaque toolchain version token. Equality is exact string comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version(String);

impl Version {
    /// Returns `None` for an empty token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Version(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
