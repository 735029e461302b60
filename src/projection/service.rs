//! Cluster projection service
//!
//! Each operation takes one snapshot from the source and runs pure
//! transformations over it. Nothing is cached between calls and a failed
//! snapshot read fails the whole operation with the source's error.

use std::sync::Arc;

use tracing::debug;

use super::gpu::map_slots;
use super::queues::{build_queue_forest, direct_usage, QueueBuildOptions, QueueView};
use super::resources::to_stats;
use super::status::resolve_job_status;
use super::views::{ClusterSummary, JobView, NodeView, TaskView, NODE_NOT_READY, NODE_READY};
use crate::snapshot::{ClusterSnapshot, JobRecord, NodeRecord, SnapshotError, SnapshotSource};

/// Produces dashboard views from scheduler snapshots
#[derive(Clone)]
pub struct ProjectionService {
    source: Arc<dyn SnapshotSource>,
    queue_options: QueueBuildOptions,
}

impl ProjectionService {
    pub fn new(source: Arc<dyn SnapshotSource>) -> Self {
        Self {
            source,
            queue_options: QueueBuildOptions::default(),
        }
    }

    pub fn with_queue_options(mut self, options: QueueBuildOptions) -> Self {
        self.queue_options = options;
        self
    }

    /// Node, GPU, queue and job-status totals
    pub fn cluster_summary(&self) -> Result<ClusterSummary, SnapshotError> {
        let snapshot = self.source.snapshot()?;
        Ok(summarize(&snapshot))
    }

    /// Queue forest with accumulated usage
    pub fn queues(&self) -> Result<Vec<QueueView>, SnapshotError> {
        let snapshot = self.source.snapshot()?;
        let usage = direct_usage(snapshot.jobs.values());
        let forest = build_queue_forest(&snapshot.queues, &usage, self.queue_options);
        debug!(
            "Projected {} queues into {} top-level queues",
            snapshot.queues.len(),
            forest.len()
        );
        Ok(forest)
    }

    /// Jobs and their tasks; an empty namespace means every namespace
    pub fn jobs(&self, namespace: &str) -> Result<Vec<JobView>, SnapshotError> {
        let snapshot = self.source.snapshot()?;
        let jobs: Vec<JobView> = snapshot
            .jobs
            .values()
            .filter(|job| namespace.is_empty() || job.namespace == namespace)
            .map(job_view)
            .collect();
        debug!(
            "Projected {} of {} jobs (namespace filter: {:?})",
            jobs.len(),
            snapshot.jobs.len(),
            namespace
        );
        Ok(jobs)
    }

    /// Nodes with resource stats and GPU slot occupancy
    pub fn nodes(&self) -> Result<Vec<NodeView>, SnapshotError> {
        let snapshot = self.source.snapshot()?;
        Ok(snapshot.nodes.values().map(node_view).collect())
    }
}

fn summarize(snapshot: &ClusterSnapshot) -> ClusterSummary {
    let mut summary = ClusterSummary {
        total_queues: snapshot.queues.len(),
        ..Default::default()
    };

    for node in snapshot.nodes.values() {
        summary.total_nodes += 1;
        if node.is_ready() {
            summary.healthy_nodes += 1;
        }
        summary.total_gpus = summary
            .total_gpus
            .saturating_add(to_stats(&node.allocatable).gpu);
        summary.allocated_gpus = summary
            .allocated_gpus
            .saturating_add(to_stats(&node.used).gpu);
    }

    for job in snapshot.jobs.values() {
        let status = resolve_job_status(job);
        *summary
            .job_counts
            .entry(status.as_str().to_string())
            .or_default() += 1;
    }

    summary
}

fn job_view(job: &JobRecord) -> JobView {
    JobView {
        uid: job.uid.clone(),
        name: job.name.clone(),
        namespace: job.namespace.clone(),
        queue: job.queue.clone(),
        status: resolve_job_status(job).to_string(),
        create_time: job.creation_timestamp,
        tasks: job
            .tasks
            .iter()
            .map(|task| TaskView {
                name: task.name.clone(),
                status: task.status.to_string(),
                node_name: task.node_name.clone(),
            })
            .collect(),
    }
}

fn node_view(node: &NodeRecord) -> NodeView {
    NodeView {
        name: node.name.clone(),
        status: if node.is_ready() {
            NODE_READY
        } else {
            NODE_NOT_READY
        }
        .to_string(),
        allocatable: to_stats(&node.allocatable),
        used: to_stats(&node.used),
        gpu_slots: map_slots(node),
    }
}
