use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use petalinux_tales::config::{self, Settings, SettingsOverrides, INSTALL_DIR_ENV};
use petalinux_tales::models::EXIT_FAILURE;
use petalinux_tales::orchestrator::ProcessExecutor;
use petalinux_tales::prompt::ConsolePrompt;
use petalinux_tales::toolchain;
use petalinux_tales::workflows::{PackageOptions, Workflow, WorkflowContext};
use petalinux_tales::LogCollector;

#[derive(Parser)]
#[command(name = "petalinux_tales")]
#[command(version)]
#[command(about = "Drive the PetaLinux toolchain from a BSP and an XSA to bootable artifacts")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a Linux image from an existing BSP
    FromBsp {
        /// BSP file to create the project from
        #[arg(short = 'b', long)]
        bsp: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Create a BSP from a blank template and customize it
    CreateBsp {
        /// PetaLinux template (zynq, zynqMP, versal, microblaze)
        #[arg(short = 't', long)]
        template: String,

        /// Output path of the packaged BSP
        #[arg(short = 'o', long)]
        output: PathBuf,

        /// Package the finished project as a BSP
        #[arg(long)]
        package_bsp: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
}

impl Commands {
    fn common(&self) -> &CommonArgs {
        match self {
            Commands::FromBsp { common, .. } | Commands::CreateBsp { common, .. } => common,
        }
    }
}

#[derive(Args)]
struct CommonArgs {
    /// Hardware description (.xsa)
    #[arg(short = 'x', long)]
    xsa: PathBuf,

    /// Working directory where projects are created [default: work]
    #[arg(short = 'd', long)]
    dir: Option<PathBuf>,

    /// PetaLinux installation directory [default: /home/embeddev/petalinux]
    #[arg(short = 'p', long, env = INSTALL_DIR_ENV)]
    install_dir: Option<PathBuf>,

    /// Settings file (.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for the full and parsed log files [default: logs]
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Do not echo toolchain output to the terminal
    #[arg(short, long)]
    quiet: bool,
}

impl CommonArgs {
    fn settings(&self) -> Result<(Settings, Option<PathBuf>)> {
        let overrides = SettingsOverrides {
            work_dir: self.dir.clone(),
            install_dir: self.install_dir.clone(),
            log_dir: self.log_dir.clone(),
            quiet: self.quiet,
        };
        config::resolve_settings(self.config.as_deref(), overrides)
            .context("Failed to load settings")
    }
}

fn main() {
    let cli = Cli::parse();

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            EXIT_FAILURE
        }
    };

    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let (settings, settings_file) = cli.command.common().settings()?;

    let log_collector = Arc::new(
        LogCollector::new(settings.log_dir.clone(), true).with_context(|| {
            format!("Failed to open log files in {}", settings.log_dir.display())
        })?,
    );
    if let Err(e) = log_collector.install(log::LevelFilter::Info) {
        eprintln!("{} {}", "warning:".yellow(), e);
    }
    log::info!("Full log: {}", log_collector.full_log_path().display());
    if let Some(path) = settings_file {
        log::info!("Loaded settings from {}", path.display());
    }

    let code = run_workflow(cli.command, &settings, &log_collector);

    if let Err(e) = log_collector.wait_for_empty() {
        eprintln!("{} {}", "warning:".yellow(), e);
    }
    code
}

fn run_workflow(
    command: Commands,
    settings: &Settings,
    log_collector: &Arc<LogCollector>,
) -> Result<i32> {
    let preflight = ProcessExecutor::new(None)
        .context("Failed to start the process runtime")?
        .with_echo(false);
    toolchain::ensure_toolchain_available(&preflight)?;

    let executor = ProcessExecutor::new(Some(Arc::clone(log_collector)))
        .context("Failed to start the process runtime")?
        .with_echo(settings.echo_output);

    let collector = Some(Arc::clone(log_collector));
    let prompt = Box::new(ConsolePrompt::stdio());
    let mut workflow = match command {
        Commands::FromBsp { bsp, common } => Workflow::prepare_image_from_package(
            &settings.work_dir,
            &settings.install_dir,
            &common.xsa,
            &bsp,
            Box::new(executor),
            prompt,
            collector,
        )?,
        Commands::CreateBsp {
            template,
            output,
            package_bsp,
            common,
        } => {
            let ctx = WorkflowContext::prepare(
                &settings.work_dir,
                &settings.install_dir,
                &common.xsa,
                Box::new(executor),
                prompt,
            )?;
            Workflow::create_package(
                ctx,
                PackageOptions {
                    template,
                    output,
                    package_bsp,
                },
                collector,
            )
        }
    };

    log::info!(
        "Workflow {} steps: {}",
        workflow.name(),
        workflow.step_names().join(" -> ")
    );

    match workflow.run() {
        Ok(_) => Ok(0),
        Err(e) => {
            log::error!("Workflow {} failed: {}", workflow.name(), e);
            Ok(e.exit_code())
        }
    }
}
