//! Workflow definitions: fixed step orderings over a shared `WorkflowContext`.
//!
//! - `image`: build a Linux image from an existing BSP
//!   (create from package -> reconfigure with XSA -> build)
//! - `package`: create and customize a BSP from a blank template
//!   (create from template -> reconfigure -> customize -> build loop ->
//!   artifact check -> boot image -> optional BSP packaging)
//!
//! Each workflow is a function returning a `Vec<Step<WorkflowContext>>`; the
//! `Workflow` type only wires that list into a `Sequencer`.

pub mod image;
pub mod package;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{SequenceError, StepError, WorkflowError};
use crate::log_collector::LogCollector;
use crate::models::{CommandRequest, CommandResult};
use crate::orchestrator::{CommandRunner, SequenceReport, Sequencer, Step, StepResult};
use crate::prompt::OperatorPrompt;
use crate::toolchain;
use crate::version::VersionGate;

pub use package::PackageOptions;

/// State shared by the steps of one workflow run.
///
/// The project name is written once, by the project-creation step, and read
/// by every later step. Sequential execution makes locking unnecessary.
pub struct WorkflowContext {
    /// Absolute working directory; projects are created inside it
    pub work_dir: PathBuf,
    /// Absolute path of the hardware description (.xsa)
    pub hw_description: PathBuf,
    pub gate: VersionGate,
    /// Unix seconds used to make project names unique
    pub timestamp: i64,
    runner: Box<dyn CommandRunner>,
    prompt: Box<dyn OperatorPrompt>,
    project_name: Option<String>,
}

impl WorkflowContext {
    pub fn new(
        work_dir: PathBuf,
        hw_description: PathBuf,
        gate: VersionGate,
        runner: Box<dyn CommandRunner>,
        prompt: Box<dyn OperatorPrompt>,
    ) -> Self {
        WorkflowContext {
            work_dir,
            hw_description,
            gate,
            timestamp: chrono::Utc::now().timestamp(),
            runner,
            prompt,
            project_name: None,
        }
    }

    /// Validate inputs and resolve the installed toolchain version.
    ///
    /// # Errors
    /// * `WorkflowError::MissingInput` - the hardware description does not exist
    /// * `WorkflowError::Version` - the installed version cannot be determined
    /// * `WorkflowError::Io` - the working directory cannot be created
    pub fn prepare(
        work_dir: &Path,
        install_dir: &Path,
        hw_description: &Path,
        runner: Box<dyn CommandRunner>,
        prompt: Box<dyn OperatorPrompt>,
    ) -> Result<Self, WorkflowError> {
        let hw_description = require_file(hw_description)?;

        let gate = VersionGate::from_install_dir(install_dir)?;
        log::info!("Installed PetaLinux version: {}", gate.installed());

        fs::create_dir_all(work_dir)?;
        let work_dir = fs::canonicalize(work_dir)?;

        Ok(WorkflowContext::new(
            work_dir,
            hw_description,
            gate,
            runner,
            prompt,
        ))
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The created project's name; fails loudly if no project exists yet.
    pub fn project_name(&self) -> Result<&str, StepError> {
        self.project_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or(StepError::ProjectNameUnset)
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.project_name = Some(name.into());
    }

    pub fn project_dir(&self) -> Result<PathBuf, StepError> {
        Ok(self.work_dir.join(self.project_name()?))
    }

    pub fn run(&self, request: &CommandRequest) -> CommandResult {
        self.runner.run(request)
    }

    pub fn prompt(&mut self) -> &mut dyn OperatorPrompt {
        self.prompt.as_mut()
    }
}

/// Absolute path of an input file that must exist.
pub fn require_file(path: &Path) -> Result<PathBuf, WorkflowError> {
    if !path.is_file() {
        return Err(WorkflowError::MissingInput(path.to_path_buf()));
    }
    Ok(fs::canonicalize(path)?)
}

/// Step shared by both workflows: apply the hardware description to the project.
pub fn reconfigure_project_with_xsa(ctx: &mut WorkflowContext) -> StepResult {
    let project_dir = ctx.project_dir()?;
    log::info!(
        "Reconfiguring project {} with {}",
        ctx.project_name()?,
        ctx.hw_description.display()
    );

    let request =
        toolchain::reconfigure_with_hw_description(&ctx.hw_description).current_dir(project_dir);
    Ok(ctx.run(&request).exit_code)
}

/// A step list wired into a sequencer together with its context.
pub struct Workflow {
    name: &'static str,
    ctx: WorkflowContext,
    sequencer: Sequencer<WorkflowContext>,
}

impl Workflow {
    pub fn new(
        name: &'static str,
        ctx: WorkflowContext,
        steps: Vec<Step<WorkflowContext>>,
        log_collector: Option<Arc<LogCollector>>,
    ) -> Self {
        Workflow {
            name,
            ctx,
            sequencer: Sequencer::new(steps).with_log_collector(log_collector),
        }
    }

    /// Build a Linux image from an existing board-support package.
    pub fn image_from_package(
        ctx: WorkflowContext,
        bsp: &Path,
        log_collector: Option<Arc<LogCollector>>,
    ) -> Result<Self, WorkflowError> {
        let bsp = require_file(bsp)?;
        Ok(Workflow::new(
            "from-bsp",
            ctx,
            image::steps(bsp),
            log_collector,
        ))
    }

    /// Validate every input, then build the image-from-package workflow.
    ///
    /// The package is checked before the context is prepared so a missing
    /// BSP leaves no working directory behind.
    pub fn prepare_image_from_package(
        work_dir: &Path,
        install_dir: &Path,
        hw_description: &Path,
        bsp: &Path,
        runner: Box<dyn CommandRunner>,
        prompt: Box<dyn OperatorPrompt>,
        log_collector: Option<Arc<LogCollector>>,
    ) -> Result<Self, WorkflowError> {
        let bsp = require_file(bsp)?;
        let ctx = WorkflowContext::prepare(work_dir, install_dir, hw_description, runner, prompt)?;
        Workflow::image_from_package(ctx, &bsp, log_collector)
    }

    /// Create a board-support package from a blank template and let the
    /// operator customize it.
    pub fn create_package(
        ctx: WorkflowContext,
        options: PackageOptions,
        log_collector: Option<Arc<LogCollector>>,
    ) -> Self {
        Workflow::new("create-bsp", ctx, package::steps(options), log_collector)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.sequencer.step_names()
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.ctx
    }

    pub fn run(&mut self) -> Result<SequenceReport, SequenceError> {
        log::info!("Starting workflow {}", self.name);
        self.sequencer.run(&mut self.ctx)
    }
}
