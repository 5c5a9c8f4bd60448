//! csvdrop - CSV ingestion runner

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use csvdrop::{aws, parse_event, IngestSettings, Orchestrator};
use csvdrop_common::logging::{init_logging, LogLevel, LogSettings};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "csvdrop")]
#[command(author, version, about = "Load dropped CSV files into the employee table")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process the files named in an S3 event document
    Run {
        /// Event JSON file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        event: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut log_settings = LogSettings::from_env()?;
    if cli.verbose {
        log_settings = log_settings.with_level(LogLevel::Debug);
    }
    let _guard = init_logging(&log_settings)?;

    match cli.command {
        Command::Run { event } => {
            let document = read_event(&event).await?;
            let arrivals = parse_event(&document)?;
            info!(files = arrivals.len(), "Event decoded");

            let settings = IngestSettings::from_env()?;
            let collaborators = aws::load_collaborators().await;
            let report = Orchestrator::new(collaborators, settings).run(&arrivals).await?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        },
    }

    Ok(())
}

async fn read_event(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut document = String::new();
        tokio::io::stdin()
            .read_to_string(&mut document)
            .await
            .context("Failed to read event from stdin")?;
        return Ok(document);
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read event file {}", path.display()))
}
