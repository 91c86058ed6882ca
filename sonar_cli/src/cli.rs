//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "sonar", version, about = "Ultrasonic proximity monitor")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/sonar.toml")]
    pub config: PathBuf,

    /// Log and report as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Wait for the network, then monitor proximity and notify the peer on changes
    Run {
        /// Stop after this many iterations (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        iterations: Option<u64>,
        /// Print run statistics on exit
        #[arg(long, action = ArgAction::SetTrue)]
        stats: bool,
    },
    /// Take one aggregated distance reading and print it
    Measure {
        /// Pulses to aggregate (default: [sampling].count)
        #[arg(long, value_name = "N")]
        count: Option<usize>,
    },
    /// Validate config and backend construction
    SelfCheck,
    /// Health check for operational monitoring
    Health,
}
