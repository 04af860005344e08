//! Stencil CLI - template-driven static documentation builder.
//!
//! Provides commands for:
//! - `build`: Render all documents once
//! - `watch`: Rebuild on every source or template change
//! - `init`: Scaffold a new project

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{BuildArgs, InitArgs, WatchArgs};
use output::Output;

/// Stencil - template-driven static documentation builder.
#[derive(Parser)]
#[command(name = "stencil", version, about)]
struct Cli {
    /// Enable verbose output (template and highlighting diagnostics).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every document once.
    Build(BuildArgs),
    /// Rebuild whenever documents or templates change.
    Watch(WatchArgs),
    /// Create a new project with default templates.
    Init(InitArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Build(args) => commands::block_on(args.execute(cli.verbose)),
        Commands::Watch(args) => commands::block_on(args.execute(cli.verbose)),
        Commands::Init(args) => args.execute(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}
