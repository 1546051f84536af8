//! Command-line interface.
//!
//! Every global option can also be set through a `TXT_HARVEST_*` environment
//! variable (or a `.env` file), which is how the server is usually configured.
//!
//! # Examples
//!
//! ```bash
//! # Harvest a file
//! txt_harvest harvest domains.txt
//!
//! # Harvest from stdin with more workers
//! cat domains.txt | txt_harvest --max-concurrency 500 harvest -
//!
//! # Search and export
//! txt_harvest search google-site-verification --export ./results
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{
    Config, LogFormat, LogLevel, DB_PATH, DEFAULT_BIND_ADDR, DEFAULT_CORS_ORIGIN,
    DEFAULT_MAX_CONCURRENCY, DEFAULT_RESULTS_DIR, DNS_TIMEOUT_SECS, RETRY_DELAY_MS,
    RETRY_MAX_ATTEMPTS, STORAGE_FAILURE_THRESHOLD,
};

/// Top-level arguments.
#[derive(Debug, Parser)]
#[command(
    name = "txt_harvest",
    version,
    about = "Resolves DNS TXT records for large domain lists and stores them in SQLite."
)]
pub struct Cli {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info, env = "TXT_HARVEST_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain, env = "TXT_HARVEST_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Database path (SQLite file)
    #[arg(long, global = true, default_value = DB_PATH, env = "TXT_HARVEST_DB_PATH")]
    pub db_path: PathBuf,

    /// Maximum concurrent TXT lookups per batch
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CONCURRENCY, env = "TXT_HARVEST_MAX_CONCURRENCY")]
    pub max_concurrency: usize,

    /// Resolution attempts per domain, including the first one
    #[arg(long, global = true, default_value_t = RETRY_MAX_ATTEMPTS, env = "TXT_HARVEST_MAX_ATTEMPTS")]
    pub max_attempts: u32,

    /// Delay between attempts in milliseconds
    #[arg(long, global = true, default_value_t = RETRY_DELAY_MS, env = "TXT_HARVEST_RETRY_DELAY_MS")]
    pub retry_delay_ms: u64,

    /// Per-query DNS timeout in seconds
    #[arg(long, global = true, default_value_t = DNS_TIMEOUT_SECS, env = "TXT_HARVEST_DNS_TIMEOUT_SECS")]
    pub dns_timeout_secs: u64,

    /// Consecutive insert failures that abort a batch
    #[arg(long, global = true, default_value_t = STORAGE_FAILURE_THRESHOLD, env = "TXT_HARVEST_STORAGE_FAILURE_THRESHOLD")]
    pub storage_failure_threshold: u32,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve every domain in a file (`-` for stdin) and store the TXT records
    Harvest {
        /// Input file: one domain per line, or a CSV whose first column is the domain
        #[arg(value_parser)]
        file: PathBuf,
    },

    /// Serve the HTTP API used by the web client
    Serve {
        /// Listen address
        #[arg(long, default_value = DEFAULT_BIND_ADDR, env = "TXT_HARVEST_BIND")]
        bind: String,

        /// Directory for search exports and downloads
        #[arg(long, default_value = DEFAULT_RESULTS_DIR, env = "TXT_HARVEST_RESULTS_DIR")]
        results_dir: PathBuf,

        /// Origin allowed by CORS
        #[arg(long, default_value = DEFAULT_CORS_ORIGIN, env = "TXT_HARVEST_CORS_ORIGIN")]
        cors_origin: String,
    },

    /// Find records with a TXT value containing a keyword (case-insensitive)
    Search {
        /// Substring to look for
        keyword: String,

        /// Also write the matches to `<DIR>/results_<unix seconds>.csv`
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
    },

    /// Print every stored record as JSON
    List {
        /// List recent batches instead of records
        #[arg(long)]
        batches: bool,

        /// Number of batches shown with `--batches`
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

impl Cli {
    /// Library configuration for these arguments.
    pub fn to_config(&self) -> Config {
        let mut config = Config {
            log_level: self.log_level.clone(),
            log_format: self.log_format.clone(),
            db_path: self.db_path.clone(),
            max_concurrency: self.max_concurrency,
            max_attempts: self.max_attempts,
            retry_delay_ms: self.retry_delay_ms,
            dns_timeout_secs: self.dns_timeout_secs,
            storage_failure_threshold: self.storage_failure_threshold,
            ..Default::default()
        };
        if let Command::Serve {
            bind,
            results_dir,
            cors_origin,
        } = &self.command
        {
            config.bind = bind.clone();
            config.results_dir = results_dir.clone();
            config.cors_origin = cors_origin.clone();
        }
        config
    }
}
