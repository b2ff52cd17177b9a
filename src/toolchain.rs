//! PetaLinux command vocabulary.
//!
//! Every builder returns an explicit argument vector; the caller decides the
//! working directory.

use crate::error::WorkflowError;
use crate::models::CommandRequest;
use crate::orchestrator::CommandRunner;
use std::ffi::OsStr;
use std::path::Path;

pub const PETALINUX_CREATE: &str = "petalinux-create";
pub const PETALINUX_CONFIG: &str = "petalinux-config";
pub const PETALINUX_BUILD: &str = "petalinux-build";
pub const PETALINUX_PACKAGE: &str = "petalinux-package";

pub fn create_from_package(bsp: &Path, project_name: &str) -> CommandRequest {
    CommandRequest::new([
        OsStr::new(PETALINUX_CREATE),
        OsStr::new("project"),
        OsStr::new("--source"),
        bsp.as_os_str(),
        OsStr::new("--name"),
        OsStr::new(project_name),
    ])
}

pub fn create_from_template(template: &str, project_name: &str) -> CommandRequest {
    CommandRequest::new([
        PETALINUX_CREATE,
        "project",
        "--template",
        template,
        "--name",
        project_name,
    ])
}

pub fn reconfigure_with_hw_description(xsa: &Path) -> CommandRequest {
    CommandRequest::new([
        OsStr::new(PETALINUX_CONFIG),
        OsStr::new("--get-hw-description"),
        xsa.as_os_str(),
        OsStr::new("--silentconfig"),
        OsStr::new("--debug"),
    ])
}

pub fn build() -> CommandRequest {
    CommandRequest::new([PETALINUX_BUILD])
}

pub fn package_boot_image(fsbl: &Path) -> CommandRequest {
    CommandRequest::new([
        OsStr::new(PETALINUX_PACKAGE),
        OsStr::new("boot"),
        OsStr::new("--fsbl"),
        fsbl.as_os_str(),
        OsStr::new("--u-boot"),
    ])
}

pub fn package_bsp(project_dir: &Path, output: &Path) -> CommandRequest {
    CommandRequest::new([
        OsStr::new(PETALINUX_PACKAGE),
        OsStr::new("bsp"),
        OsStr::new("--project"),
        project_dir.as_os_str(),
        OsStr::new("--output"),
        output.as_os_str(),
    ])
}

/// Fail early when the PetaLinux tools are not on PATH.
pub fn ensure_toolchain_available(runner: &dyn CommandRunner) -> Result<(), WorkflowError> {
    let result = runner.run(&CommandRequest::new([PETALINUX_CREATE, "--help"]));
    if result.command_not_found {
        return Err(WorkflowError::ToolchainUnavailable(format!(
            "{} not found; source the PetaLinux settings script first",
            PETALINUX_CREATE
        )));
    }
    Ok(())
}
