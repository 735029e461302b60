//! Command implementations for the CLI
//!
//! SBIO pattern: Commands return Results, I/O is handled by caller

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::display::{
    format_job_list, format_node_list, format_queue_tree, format_summary, format_validation,
};
use super::{GetArgs, GetResource, OutputFormat, ServeArgs};
use crate::client::{ClientError, VisualizerClient};
use crate::config::{expand_path, Config, ServerConfig};
use crate::projection::{ProjectionService, QueueBuildOptions};
use crate::snapshot::{
    validate_snapshot, FileSnapshotSource, SnapshotError, SnapshotSource, SnapshotWarning,
};

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No snapshot source: pass --snapshot, --url, or set snapshot.path in the config file")]
    NoSource,
}

/// Result type for commands
pub type CommandResult<T> = Result<T, CommandError>;

// ============================================================================
// Settings resolution (Pure business logic)
// ============================================================================

/// Resolved settings for `schedview serve`
#[derive(Debug, Clone, PartialEq)]
pub struct ServeSettings {
    pub server: ServerConfig,
    pub snapshot: PathBuf,
    pub queue_options: QueueBuildOptions,
}

/// Merge serve flags over the config file; flags win
pub fn resolve_serve_settings(args: &ServeArgs, config: &Config) -> CommandResult<ServeSettings> {
    let mut server = config.server.clone();
    if let Some(ref addr) = args.bind_addr {
        server.bind_addr = addr.clone();
    }
    if let Some(port) = args.port {
        server.port = port;
    }

    let snapshot = resolve_snapshot_path(args.snapshot.as_deref(), config)
        .ok_or(CommandError::NoSource)?;

    let mut queue_options = config.projection.queue_options();
    if args.queue_usage_fallback {
        queue_options.usage_fallback = true;
    }

    Ok(ServeSettings {
        server,
        snapshot,
        queue_options,
    })
}

/// Snapshot path from the flag, else the config file
pub fn resolve_snapshot_path(flag: Option<&Path>, config: &Config) -> Option<PathBuf> {
    flag.map(expand_path)
        .or_else(|| config.snapshot.path.clone())
}

/// Where `get` reads its views from
pub enum ViewSource {
    Local(ProjectionService),
    Remote(VisualizerClient),
}

impl ViewSource {
    /// Pick the source for a get command: `--url` first, then a snapshot file
    pub fn resolve(args: &GetArgs, config: &Config) -> CommandResult<Self> {
        if let Some(ref url) = args.url {
            return Ok(Self::Remote(VisualizerClient::new(url.clone())));
        }
        let path = resolve_snapshot_path(args.snapshot.as_deref(), config)
            .ok_or(CommandError::NoSource)?;
        Ok(Self::local(
            Arc::new(FileSnapshotSource::new(path)),
            config.projection.queue_options(),
        ))
    }

    pub fn local(source: Arc<dyn SnapshotSource>, options: QueueBuildOptions) -> Self {
        Self::Local(ProjectionService::new(source).with_queue_options(options))
    }
}

// ============================================================================
// Get command
// ============================================================================

/// Fetch one view and render it in the requested format
pub async fn get_view(
    source: &ViewSource,
    resource: &GetResource,
    output: OutputFormat,
) -> CommandResult<String> {
    debug!("Fetching {:?}", resource);
    match resource {
        GetResource::Summary => {
            let summary = match source {
                ViewSource::Local(service) => service.cluster_summary()?,
                ViewSource::Remote(client) => client.summary().await?,
            };
            render(&summary, output, format_summary)
        }
        GetResource::Queues => {
            let queues = match source {
                ViewSource::Local(service) => service.queues()?,
                ViewSource::Remote(client) => client.queues().await?,
            };
            render(&queues, output, |q| format_queue_tree(q))
        }
        GetResource::Jobs { namespace } => {
            let jobs = match source {
                ViewSource::Local(service) => {
                    service.jobs(namespace.as_deref().unwrap_or_default())?
                }
                ViewSource::Remote(client) => client.jobs(namespace.as_deref()).await?,
            };
            render(&jobs, output, |j| format_job_list(j))
        }
        GetResource::Nodes => {
            let nodes = match source {
                ViewSource::Local(service) => service.nodes()?,
                ViewSource::Remote(client) => client.nodes().await?,
            };
            render(&nodes, output, |n| format_node_list(n))
        }
    }
}

fn render<T, F>(view: &T, output: OutputFormat, table: F) -> CommandResult<String>
where
    T: Serialize,
    F: Fn(&T) -> String,
{
    match output {
        OutputFormat::Table => Ok(table(view)),
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(view)?)),
    }
}

// ============================================================================
// Validate command
// ============================================================================

/// Result of validating a snapshot file
#[derive(Debug)]
pub struct ValidationReport {
    pub nodes: usize,
    pub queues: usize,
    pub jobs: usize,
    pub warnings: Vec<SnapshotWarning>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Load a snapshot file and check it for inconsistencies
pub fn validate_file(path: &Path) -> CommandResult<ValidationReport> {
    let snapshot = FileSnapshotSource::new(path).snapshot()?;
    Ok(ValidationReport {
        nodes: snapshot.nodes.len(),
        queues: snapshot.queues.len(),
        jobs: snapshot.jobs.len(),
        warnings: validate_snapshot(&snapshot),
    })
}

/// Render a validation report
pub fn format_validation_report(path: &Path, report: &ValidationReport) -> String {
    format_validation(&path.display().to_string(), report)
}
