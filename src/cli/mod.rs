//! CLI module for schedview
//!
//! Subcommands:
//! - `schedview serve` - Serve the visualizer API over a snapshot file
//! - `schedview get` - Print one view, from a snapshot file or a running server
//! - `schedview validate` - Check a snapshot file for inconsistencies

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod display;

pub use commands::*;
pub use display::*;

#[derive(Parser, Debug)]
#[command(name = "schedview")]
#[command(about = "Read-only views over a GPU scheduler's cluster state")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging output (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: ~/.schedview/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the visualizer API
    Serve(ServeArgs),

    /// Print a view
    Get(GetArgs),

    /// Validate a snapshot file
    Validate(ValidateArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Bind address for the server (default from config: 0.0.0.0)
    #[arg(long)]
    pub bind_addr: Option<String>,

    /// Port to listen on (default from config: 8081)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Snapshot file to serve (JSON or YAML)
    #[arg(long, value_name = "FILE", env = "SCHEDVIEW_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Fill queues without job usage from their usage estimate
    #[arg(long)]
    pub queue_usage_fallback: bool,
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// View to print
    #[command(subcommand)]
    pub resource: GetResource,

    /// Read views from a snapshot file (JSON or YAML)
    #[arg(long, value_name = "FILE", global = true, conflicts_with = "url")]
    pub snapshot: Option<PathBuf>,

    /// Read views from a running schedview server
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum GetResource {
    /// Cluster summary
    #[command(name = "summary", visible_alias = "sum")]
    Summary,

    /// Queue hierarchy
    #[command(name = "queues", visible_alias = "queue", visible_alias = "q")]
    Queues,

    /// Jobs and their tasks
    #[command(name = "jobs", visible_alias = "job", visible_alias = "j")]
    Jobs {
        /// Namespace (omit for all namespaces)
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Nodes and their GPU slots
    #[command(name = "nodes", visible_alias = "node", visible_alias = "no")]
    Nodes,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Arguments for the validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to the snapshot file
    pub file: PathBuf,
}
