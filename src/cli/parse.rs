//! CLI parse: clap types for dailydraft. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dailydraft - resilient daily content draft generation
#[derive(Parser)]
#[command(name = "dailydraft")]
#[command(about = "Generate the day's content drafts and record them in the calendar sheet")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run today's generation and append the results
    Run {
        /// Objective label (overrides run.objective)
        #[arg(long)]
        objective: Option<String>,
        /// Read the store but print rows instead of appending them
        #[arg(long)]
        dry_run: bool,
        /// Generate even if today already has drafts
        #[arg(long)]
        rerun: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List eligible models in the order they would be tried
    Models {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show what the calendar already holds for today
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
