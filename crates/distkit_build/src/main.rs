//! distkit CLI - freeze and stage the tracker distribution

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use distkit_build::{BuildConfig, EnumBuildStep, SpecRunOptions};

/// distkit - build the tracker distribution
#[derive(Debug, Parser)]
#[command(name = "distkit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Package tracker.py into a standalone executable
    Freeze,

    /// Copy tracker.py and its venv into dist/python
    Stage(StageArgs),

    /// Freeze, then stage (default)
    All(AllArgs),
}

#[derive(Debug, Clone, Default, Args)]
struct AllArgs {
    /// Additional entry names to leave out of the venv copy
    #[arg(long = "exclude", value_name = "NAME")]
    exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, Args)]
struct StageArgs {
    /// Additional entry names to leave out of the venv copy
    #[arg(long = "exclude", value_name = "NAME")]
    exclude: Vec<String>,

    /// Report what the venv copy would do without writing
    #[arg(long)]
    dry_run: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .with(filter)
        .init();

    let dir_project = cli
        .project
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let (step, stage_args) = match cli.command {
        Some(Commands::Freeze) => (EnumBuildStep::Freeze, StageArgs::default()),
        Some(Commands::Stage(args)) => (EnumBuildStep::Stage, args),
        // Packaging has no dry mode, so `all` never skips writes.
        Some(Commands::All(args)) => (
            EnumBuildStep::All,
            StageArgs {
                exclude: args.exclude,
                dry_run: false,
            },
        ),
        None => (EnumBuildStep::All, StageArgs::default()),
    };

    let cfg = BuildConfig::from_project_root(dir_project).with_extra_excludes(stage_args.exclude);
    let spec_run_options = SpecRunOptions {
        if_dry_run: stage_args.dry_run,
    };

    match distkit_build::run(&cfg, step, spec_run_options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Build failed: {e}");
            ExitCode::FAILURE
        }
    }
}
