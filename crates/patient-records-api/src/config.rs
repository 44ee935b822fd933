//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use patient_records_core::VerdictPolicy;
use serde::Serialize;

pub const DEFAULT_DATABASE: &str = "patients.db";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
pub const DEFAULT_LOG_FILTER: &str = "info,patient_records=debug,tower_http=debug";

#[derive(Parser, Debug)]
#[command(name = "patient-records")]
#[command(about = "Patient record management API", version, long_about = None)]
pub struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "PATIENT_RECORDS_DB", default_value = DEFAULT_DATABASE)]
    pub database: PathBuf,

    /// BMI verdict buckets: `compatible` keeps the historical [24.9, 25) gap,
    /// `contiguous` closes it
    #[arg(
        long,
        global = true,
        env = "PATIENT_RECORDS_VERDICT_POLICY",
        default_value = "compatible"
    )]
    pub verdict_policy: VerdictPolicy,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, env = "PATIENT_RECORDS_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve {
        /// Address to listen on
        #[arg(long, env = "PATIENT_RECORDS_BIND", default_value = DEFAULT_BIND)]
        bind: SocketAddr,
    },
    /// Load a JSON patient document into the database
    Import {
        /// Path to the JSON document
        file: PathBuf,
        /// Keep stored records whose id appears in the document
        #[arg(long)]
        skip_existing: bool,
    },
    /// Write the database out as a JSON patient document
    Export {
        /// Destination path
        file: PathBuf,
    },
}

/// Resolved settings shared by every command.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Config {
    pub database: PathBuf,
    pub verdict_policy: VerdictPolicy,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            verdict_policy: VerdictPolicy::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            database: self.database.clone(),
            verdict_policy: self.verdict_policy,
            log_filter: self.log_filter.clone(),
        }
    }

    /// The subcommand to run; `serve` on the default address when omitted.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or_else(|| Command::Serve {
            bind: default_bind(),
        })
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}
