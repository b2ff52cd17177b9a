//! Create-and-customize workflow for a new BSP.
//!
//! The operator gets two kinds of blocking prompts: one pause before the first
//! build, and a Y/N question after every build attempt. The build loop has no
//! attempt limit; it ends only when the operator opts out.

use colored::Colorize;
use std::path::PathBuf;

use super::{reconfigure_project_with_xsa, WorkflowContext};
use crate::artifacts;
use crate::models::{EXIT_FAILURE, EXIT_SUCCESS};
use crate::orchestrator::{Step, StepResult};
use crate::toolchain;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageOptions {
    /// Toolchain template, e.g. `zynqMP`
    pub template: String,
    /// Where the packaged BSP is written
    pub output: PathBuf,
    /// Append the `package_as_bsp` step
    pub package_bsp: bool,
}

pub fn steps(options: PackageOptions) -> Vec<Step<WorkflowContext>> {
    let PackageOptions {
        template,
        output,
        package_bsp,
    } = options;
    let create_template = template.clone();

    let mut steps = vec![
        Step::new("create_project", move |ctx: &mut WorkflowContext| {
            create_project(ctx, &create_template)
        }),
        Step::new("reconfigure_project_with_xsa", reconfigure_project_with_xsa),
        Step::new("wait_for_user_customization", wait_for_user_customization),
        Step::new("build", build_until_operator_done),
        Step::new("check_post_build_images_exist", check_post_build_images_exist),
        Step::new("create_boot_image_file", move |ctx: &mut WorkflowContext| {
            create_boot_image_file(ctx, &template)
        }),
    ];

    if package_bsp {
        steps.push(Step::new(
            "package_as_bsp",
            move |ctx: &mut WorkflowContext| package_as_bsp(ctx, &output),
        ));
    }

    steps
}

/// `petalinux_tales_bsp_<template>_<installed version>_<timestamp>`
pub fn project_name_for(template: &str, installed_version: &str, timestamp: i64) -> String {
    format!(
        "petalinux_tales_bsp_{}_{}_{}",
        template, installed_version, timestamp
    )
}

pub fn create_project(ctx: &mut WorkflowContext, template: &str) -> StepResult {
    let project_name = project_name_for(template, ctx.gate.installed().as_str(), ctx.timestamp);
    log::info!("Creating PetaLinux project {}", project_name);

    let request =
        toolchain::create_from_template(template, &project_name).current_dir(&ctx.work_dir);
    let result = ctx.run(&request);
    if result.success() {
        ctx.set_project_name(project_name);
    }
    Ok(result.exit_code)
}

pub fn wait_for_user_customization(ctx: &mut WorkflowContext) -> StepResult {
    let project_dir = ctx.project_dir()?;
    log::info!(
        "Now you can customize the BSP located in {}",
        project_dir.display()
    );
    ctx.prompt().pause("Press Enter to continue to build")?;
    Ok(EXIT_SUCCESS)
}

/// Build, then ask the operator whether to keep customizing; repeat while they do.
///
/// Returns 0 if the last attempt succeeded, 1 if it failed and the operator
/// gave up.
pub fn build_until_operator_done(ctx: &mut WorkflowContext) -> StepResult {
    let project_dir = ctx.project_dir()?;

    loop {
        let result = ctx.run(&toolchain::build().current_dir(&project_dir));
        let succeeded = result.success();

        let question = if succeeded {
            format!(
                "{} Do you still need to make more customizations to this BSP? \
                 Press Y to keep working on this and we will re-build. \
                 Press N if you are done with your customizations. (Y/N)",
                "Build succeed!".green()
            )
        } else {
            format!(
                "{} You can keep working in this BSP if you want. \
                 Press Y to keep working on this and we will re-build. \
                 Press N if you want to abort. (Y/N)",
                "Build failed :(".red()
            )
        };

        if !ctx.prompt().confirm(&question)? {
            return Ok(if succeeded { EXIT_SUCCESS } else { EXIT_FAILURE });
        }
        log::info!("Rebuilding {} after operator changes", project_dir.display());
    }
}

pub fn check_post_build_images_exist(ctx: &mut WorkflowContext) -> StepResult {
    let project_dir = ctx.project_dir()?;
    if artifacts::missing_boot_artifacts(&project_dir).is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILURE)
    }
}

/// Package FSBL, PMU firmware, TF-A and u-boot into BOOT.BIN and verify it.
pub fn create_boot_image_file(ctx: &mut WorkflowContext, template: &str) -> StepResult {
    let project_dir = ctx.project_dir()?;
    let fsbl = artifacts::fsbl_path(&project_dir, template);

    let request = toolchain::package_boot_image(&fsbl).current_dir(&project_dir);
    let result = ctx.run(&request);
    if !result.success() {
        return Ok(result.exit_code);
    }

    if artifacts::probe(&artifacts::boot_image_path(&project_dir)) {
        Ok(EXIT_SUCCESS)
    } else {
        log::error!("boot image was not generated :(");
        Ok(EXIT_FAILURE)
    }
}

pub fn package_as_bsp(ctx: &mut WorkflowContext, output: &std::path::Path) -> StepResult {
    let project_dir = ctx.project_dir()?;
    log::info!("Packaging {} as BSP into {}", project_dir.display(), output.display());

    let request = toolchain::package_bsp(&project_dir, output).current_dir(&project_dir);
    Ok(ctx.run(&request).exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(package_bsp: bool) -> PackageOptions {
        PackageOptions {
            template: "zynqMP".to_string(),
            output: PathBuf::from("/out/board.bsp"),
            package_bsp,
        }
    }

    #[test]
    fn test_project_name_format() {
        assert_eq!(
            project_name_for("zynqMP", "2024.2", 42),
            "petalinux_tales_bsp_zynqMP_2024.2_42"
        );
    }

    #[test]
    fn test_step_order_without_bsp_packaging() {
        let names: Vec<String> = steps(options(false))
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "create_project",
                "reconfigure_project_with_xsa",
                "wait_for_user_customization",
                "build",
                "check_post_build_images_exist",
                "create_boot_image_file",
            ]
        );
    }

    #[test]
    fn test_bsp_packaging_is_last() {
        let steps = steps(options(true));
        assert_eq!(steps.last().map(|s| s.name()), Some("package_as_bsp"));
        assert_eq!(steps.len(), 7);
    }
}
