//! `nativebuild` command line entry point.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use nativebuild::{
    BuildPipeline, DialoguerSelector, Selector, SpecBuildConfig, SpecBuildRequest,
    SystemProcessRunner, select_target,
};

/// Build the application into a desktop bundle for the given platform.
#[derive(Parser, Debug)]
#[command(name = "nativebuild")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Operating system to build for (win, linux, mac, all)
    os: Option<String>,

    /// Processor architecture to build for (x64, x86, arm64, all)
    arch: Option<String>,

    /// Publish the app instead of only building it
    #[arg(long)]
    publish: bool,

    /// Never prompt; fall back to defaults
    #[arg(short = 'n', long)]
    no_interaction: bool,

    /// Application root directory
    #[arg(long, value_name = "DIR", default_value = ".")]
    path: PathBuf,

    /// Config file (defaults to `<path>/nativebuild.toml`)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn run(cli: &Cli) -> Result<()> {
    let config = SpecBuildConfig::load(&cli.path, cli.config.as_deref())
        .with_context(|| format!("Failed to load config for {}", cli.path.display()))?;

    let if_interactive = !cli.no_interaction && std::io::stdin().is_terminal();
    let selector = DialoguerSelector;
    let selector: Option<&dyn Selector> = if_interactive.then_some(&selector as &dyn Selector);

    let target = select_target(cli.os.as_deref(), cli.arch.as_deref(), selector)
        .context("Failed to resolve build target")?;
    let request = SpecBuildRequest {
        target,
        if_publish: cli.publish,
        if_tty: if_interactive && !cfg!(windows),
    };

    let runner = SystemProcessRunner;
    let report = BuildPipeline::new(&config, &runner)
        .run(&request)
        .with_context(|| format!("Build for {target} failed"))?;
    log::debug!("{report}");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    nativebuild_log::init_logger(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
