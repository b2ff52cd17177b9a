//! Image-from-package workflow: create from BSP, reconfigure with XSA, build.

use std::path::{Path, PathBuf};

use super::{reconfigure_project_with_xsa, WorkflowContext};
use crate::artifacts;
use crate::models::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::orchestrator::{Step, StepResult};
use crate::toolchain;
use crate::version::VersionCheck;

/// Answer fed to `petalinux-build` for its confirmation question.
const BUILD_CONFIRMATION: &str = "Y\n";

pub fn steps(bsp: PathBuf) -> Vec<Step<WorkflowContext>> {
    vec![
        Step::new("create_project", move |ctx: &mut WorkflowContext| {
            create_project(ctx, &bsp)
        }),
        Step::new("reconfigure_project_with_xsa", reconfigure_project_with_xsa),
        Step::new("build", build),
    ]
}

/// `<bsp file stem>_<timestamp>`
pub fn project_name_for(bsp: &Path, timestamp: i64) -> String {
    let stem = bsp
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}_{}", stem, timestamp)
}

/// Create the project from the BSP, then gate on the project's toolchain version.
///
/// Returns the toolchain's exit code when creation fails, otherwise the
/// version check's code (0 match, 1 undeterminable, 2 mismatch). The project
/// name is stored only on full success.
pub fn create_project(ctx: &mut WorkflowContext, bsp: &Path) -> StepResult {
    let project_name = project_name_for(bsp, ctx.timestamp);
    log::info!("Creating PetaLinux project {}", project_name);

    let request =
        toolchain::create_from_package(bsp, &project_name).current_dir(&ctx.work_dir);
    let result = ctx.run(&request);
    if !result.success() {
        return Ok(result.exit_code);
    }

    let check = ctx.gate.check_project(&ctx.work_dir.join(&project_name));
    if let VersionCheck::Match(_) = check {
        ctx.set_project_name(project_name);
    }
    Ok(check.exit_code())
}

/// Build the image, then require both boot artifacts.
pub fn build(ctx: &mut WorkflowContext) -> StepResult {
    let project_dir = ctx.project_dir()?;

    let request = toolchain::build()
        .current_dir(&project_dir)
        .stdin_input(BUILD_CONFIRMATION);
    let result = ctx.run(&request);
    if !result.success() {
        return Ok(result.exit_code);
    }

    if artifacts::missing_boot_artifacts(&project_dir).is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name_from_bsp() {
        assert_eq!(
            project_name_for(Path::new("/bsp/xilinx-zcu102-v2024.2.bsp"), 1700000000),
            "xilinx-zcu102-v2024.2_1700000000"
        );
    }

    #[test]
    fn test_step_order() {
        let names: Vec<String> = steps(PathBuf::from("/b.bsp"))
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["create_project", "reconfigure_project_with_xsa", "build"]
        );
    }
}
