mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tabrelay_core::{OutputFormat, Platform};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::DeviceArgs;

#[derive(Parser)]
#[command(name = "tabrelay")]
#[command(
    about = "Copy and restore browser tabs between this computer and a phone",
    long_about = None
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy all open tabs from a phone's browser
    Copy {
        /// Source platform (android or ios)
        platform: Platform,

        #[command(flatten)]
        device: DeviceArgs,

        /// Output format (json or yaml)
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// Restore saved tabs to a phone
    Reopen {
        /// Target platform (android or ios)
        #[arg(short = 'P', long)]
        platform: Platform,

        /// Tab list produced by `copy` (JSON or YAML)
        file: PathBuf,

        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Check that the external debugging tools are installed
    Check {
        /// Platform to check (android, ios or all)
        platform: Option<String>,
    },

    /// Serve the tab tools to an AI assistant over stdio
    Mcp,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let device_debug = match &cli.command {
        Commands::Copy { device, .. } | Commands::Reopen { device, .. } => device.debug,
        _ => false,
    };
    let level = if cli.verbose || device_debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries command output and the MCP stream, so logs go to stderr
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Copy { platform, device, format } => {
            commands::copy::run(platform, device.options(), format).await?;
        }
        Commands::Reopen { platform, file, device } => {
            commands::reopen::run(platform, &file, device.options()).await?;
        }
        Commands::Check { platform } => {
            commands::check::run(platform).await?;
        }
        Commands::Mcp => {
            commands::mcp::run().await?;
        }
    }

    Ok(())
}
