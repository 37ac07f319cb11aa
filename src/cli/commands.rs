//! CLI command definitions for awesome-foamlib.
//!
//! Runs OpenFOAM commands against a case directory inside Docker, manages the
//! OpenFOAM image and fetches tutorial cases.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use crate::error::RunnerError;
use crate::runner::{FoamRunner, RunRequest, RunResult, RunnerConfig};
use crate::tutorial::fetch_cavity_tutorial;

/// Run OpenFOAM commands in Docker containers.
#[derive(Parser, Debug)]
#[command(name = "awesome-foamlib")]
#[command(about = "Run OpenFOAM commands in short-lived Docker containers")]
#[command(version)]
#[command(
    long_about = "awesome-foamlib runs OpenFOAM commands inside a Docker container with the case directory mounted.\n\nFiles written by the solver are owned by the invoking user.\n\nExample usage:\n  awesome-foamlib tutorial ./cavity\n  awesome-foamlib run ./cavity blockMesh\n  awesome-foamlib run ./cavity icoFoam"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Docker image with OpenFOAM installed (overrides the config file).
    #[arg(long, env = "FOAM_IMAGE", global = true)]
    pub image: Option<String>,

    /// YAML runner configuration file.
    #[arg(short, long, env = "FOAM_RUNNER_CONFIG", global = true)]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Run an OpenFOAM command against a case directory.
    Run(RunArgs),

    /// Pull the OpenFOAM image if it is not available locally.
    Pull,

    /// Print a resource usage snapshot of a container as JSON.
    Stats(StatsArgs),

    /// Fetch the lid-driven cavity tutorial case.
    Tutorial(TutorialArgs),
}

/// Arguments for `awesome-foamlib run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Case directory mounted into the container.
    pub case_dir: PathBuf,

    /// Command to run, e.g. `blockMesh` or `icoFoam -parallel`.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,

    /// User to run as (uid:gid). Defaults to the current user.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Pull the image and retry once if it is missing.
    #[arg(long)]
    pub pull: bool,

    /// Output the result as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `awesome-foamlib stats`.
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// ID or name of the container.
    pub container_id: String,
}

/// Arguments for `awesome-foamlib tutorial`.
#[derive(Parser, Debug)]
pub struct TutorialArgs {
    /// Directory the case files are placed in.
    #[arg(default_value = "./cavity")]
    pub target_dir: PathBuf,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<ExitCode> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
///
/// A command that fails inside the container is not an error here: its exit
/// status is handed back so the process can exit with it once everything
/// has been dropped.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Run(ref args) => run_command(load_config(&cli)?, args).await,
        Commands::Pull => {
            let runner = FoamRunner::connect(load_config(&cli)?).await?;
            runner.pull_image().await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Stats(ref args) => {
            let runner = FoamRunner::connect(load_config(&cli)?).await?;
            let stats = runner.get_container_stats(&args.container_id).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tutorial(ref args) => {
            let path = fetch_cavity_tutorial(&args.target_dir).await?;
            info!(path = %path.display(), "Tutorial ready");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<RunnerConfig> {
    let mut config = match &cli.config {
        Some(path) => RunnerConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RunnerConfig::default(),
    };
    if let Some(image) = &cli.image {
        config = config.with_image(image);
    }
    Ok(config)
}

async fn run_command(config: RunnerConfig, args: &RunArgs) -> anyhow::Result<ExitCode> {
    let runner = FoamRunner::connect(config).await?;

    let mut request = RunRequest::new(&args.case_dir, args.command.join(" "));
    request.user = args.user.clone();

    let outcome = match runner.run_request(&request).await {
        Err(e) if args.pull && e.is_image_not_found() => {
            warn!(image = %runner.image(), "Image missing, pulling and retrying");
            runner.pull_image().await?;
            runner.run_request(&request).await
        }
        other => other,
    };

    report_outcome(outcome, args.json)
}

/// Prints a run outcome and turns it into the process exit status.
fn report_outcome(
    outcome: Result<RunResult, RunnerError>,
    json: bool,
) -> anyhow::Result<ExitCode> {
    match outcome {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", result.output);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(RunnerError::Container { exit_code, output }) => {
            eprint!("{output}");
            eprintln!("Command failed with status code {exit_code}");
            Ok(ExitCode::from(exit_status(exit_code)))
        }
        Err(e) => Err(e.into()),
    }
}

/// Maps a container exit code onto a process exit status.
///
/// Codes the platform cannot carry, and a zero that accompanies a failure,
/// become 1.
fn exit_status(exit_code: i64) -> u8 {
    match u8::try_from(exit_code) {
        Ok(0) | Err(_) => 1,
        Ok(code) => code,
    }
}
