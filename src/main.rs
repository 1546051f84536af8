//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `txt_harvest` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use txt_harvest::app::summary_line;
use txt_harvest::cli::{Cli, Command};
use txt_harvest::initialization::init_logger_with;
use txt_harvest::run::{run_harvest, run_list, run_list_batches, run_search, run_server};

#[tokio::main]
async fn main() -> Result<()> {
    // Try loading from current directory first, then from the executable's directory
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();
    let config = cli.to_config();

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    if let Err(e) = config.validate() {
        eprintln!("txt_harvest error: {e}");
        process::exit(2);
    }

    if let Err(e) = dispatch(cli.command, &config).await {
        eprintln!("txt_harvest error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

async fn dispatch(command: Command, config: &txt_harvest::Config) -> Result<()> {
    match command {
        Command::Harvest { file } => {
            let report = run_harvest(config, &file).await?;
            println!("{}", summary_line(&report));
            println!("Results saved in {}", config.db_path.display());
        }
        Command::Serve { .. } => run_server(config).await?,
        Command::Search { keyword, export } => {
            let report = run_search(config, &keyword, export.as_deref()).await?;
            if report.records.is_empty() {
                println!("No results found");
            }
            for record in &report.records {
                println!("{}\t{}", record.domain, record.batch_id);
            }
            if let Some(path) = report.export_path {
                println!("Results written to {}", path.display());
            }
        }
        Command::List { batches: true, limit } => {
            let batches = run_list_batches(config, limit).await?;
            println!("{}", serde_json::to_string_pretty(&batches)?);
        }
        Command::List { batches: false, .. } => {
            let records = run_list(config).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }
    Ok(())
}
