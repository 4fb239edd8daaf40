mod commands;
mod error;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{completions, policies, scan, Context};
use crate::error::{exit_code_for, report_error};
use leadsift_config as config;

#[derive(Debug, Parser)]
#[command(
    name = "leadsift",
    version,
    about = "Find and rank business contacts hiding in a mailbox"
)]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/leadsift/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print machine-readable reports
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Aggregate, score and export contacts from a mailbox or message dump
    Scan(scan::ScanArgs),
    /// Show the built-in filtering and scoring policies
    Policies(policies::PoliciesArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Command::Completions(args) => return completions::emit(args),
        command => command,
    };

    let app_config = load_config(cli.config)?;
    let ctx = Context {
        json: cli.json,
        config: &app_config,
    };
    match command {
        Command::Scan(args) => scan::scan(&ctx, args),
        Command::Policies(args) => policies::show_policies(&ctx, args),
        Command::Completions(_) => unreachable!("completions are emitted without a config"),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<config::AppConfig> {
    match config::resolve_config_path(path.clone()) {
        Ok(resolved) if resolved.exists() => {
            debug!(path = %resolved.display(), "loading config");
        }
        Ok(resolved) => debug!(path = %resolved.display(), "no config file, using defaults"),
        Err(err) => debug!(error = %err, "config path unavailable"),
    }
    config::load(path).context("load config")
}

/// Diagnostics go to stderr so exports piped from stdout stay clean.
/// `RUST_LOG` wins over `-v` when set.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
