//! Ember CLI, the command-line front end of the incremental build cache.
//!
//! Provides `ember build` for running a batch over the configured units,
//! `ember status` for inspecting freshness without building, and
//! `ember prune` for dropping fingerprints of deleted files.

#![warn(missing_docs)]

mod build;
mod pipeline;
mod prune;
mod status;

use std::process;

use clap::{Parser, Subcommand};

/// Ember: incremental builds of C/C++ units into JavaScript modules.
#[derive(Parser, Debug)]
#[command(name = "ember", version, about = "Ember incremental build cache")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `ember.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the configured units, reusing fresh artifacts.
    Build(BuildArgs),
    /// Report which units would be rebuilt, without building.
    Status(StatusArgs),
    /// Drop fingerprints of files that no longer exist.
    Prune,
}

/// Arguments for the `ember build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Units to build, by path (default: every configured unit).
    pub units: Vec<String>,

    /// Number of units built in parallel (default: from `ember.toml`).
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Arguments for the `ember status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Units to inspect, by path (default: every configured unit).
    pub units: Vec<String>,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    // Commands report a missing or invalid config themselves.
    let config_verbose = pipeline::load_project(&global)
        .map(|project| project.config.build.verbose)
        .unwrap_or(false);
    init_tracing(default_filter(global.verbose, config_verbose));

    let result = match cli.command {
        Command::Build(ref args) => build::run(args, &global),
        Command::Status(ref args) => status::run(args, &global),
        Command::Prune => prune::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Log filter used when `RUST_LOG` is unset: `-v` selects `debug`, and
/// `[build] verbose` selects `info` so each compiled unit is shown.
fn default_filter(cli_verbose: bool, config_verbose: bool) -> &'static str {
    if cli_verbose {
        "debug"
    } else if config_verbose {
        "info"
    } else {
        "warn"
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over `fallback`.
fn init_tracing(fallback: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}
