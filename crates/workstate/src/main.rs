//! Workstate CLI - project snapshots in object storage
//!
//! This is the main entry point for the workstate command-line interface.

mod cli;
mod commands;
mod context;
mod output;

use anyhow::{anyhow, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use context::Context;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Dropping the command future on Ctrl-C runs the drop guards of any
    // temporary archive or download in flight
    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow!("Interrupted")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from_cli(&cli)?;

    match cli.command {
        Commands::Init(args) => commands::init::run(args, &ctx),
        Commands::Configure(args) => commands::configure::run(args, &ctx),
        Commands::Config => commands::config::run(&ctx),
        Commands::Status(args) => commands::status::run(args, &ctx),
        Commands::Save(args) => commands::save::run(args, &ctx).await,
        Commands::List(args) => commands::list::run(args, &ctx).await,
        Commands::Download(args) => commands::download::run(args, &ctx).await,
        Commands::Delete(args) => commands::delete::run(args, &ctx).await,
        Commands::Share(args) => commands::share::run(args, &ctx).await,
        Commands::DownloadUrl(args) => commands::download_url::run(args, &ctx).await,
    }
}

/// Maps -q / -v flags to a log filter; RUST_LOG wins when set.
fn log_filter(verbose: u8, quiet: bool) -> EnvFilter {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(log_filter(verbose, quiet))
        .init();
}
