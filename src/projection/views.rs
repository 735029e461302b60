//! View types returned to dashboards
//!
//! Every view is built fresh per call from one snapshot and serializes with
//! the field names the web dashboard consumes.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::gpu::GpuSlot;
use super::resources::ResourceStats;

/// Overall cluster health
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    #[serde(rename = "totalNodes")]
    pub total_nodes: usize,

    /// Nodes whose Ready condition is true
    #[serde(rename = "healthyNodes")]
    pub healthy_nodes: usize,

    #[serde(rename = "totalGPUs")]
    pub total_gpus: i64,

    #[serde(rename = "allocatedGPUs")]
    pub allocated_gpus: i64,

    #[serde(rename = "totalQueues")]
    pub total_queues: usize,

    /// Job count per status label
    #[serde(rename = "jobCounts")]
    pub job_counts: BTreeMap<String, usize>,
}

/// A task inside a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskView {
    pub name: String,

    pub status: String,

    /// Empty when unscheduled
    #[serde(rename = "nodeName")]
    pub node_name: String,
}

/// A job with its tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobView {
    pub uid: String,

    pub name: String,

    pub namespace: String,

    pub queue: String,

    pub status: String,

    #[serde(rename = "createTime")]
    pub create_time: DateTime<Utc>,

    pub tasks: Vec<TaskView>,
}

/// A node with its GPU slot occupancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeView {
    pub name: String,

    /// "Ready" or "NotReady"
    pub status: String,

    pub allocatable: ResourceStats,

    pub used: ResourceStats,

    #[serde(rename = "gpuSlots")]
    pub gpu_slots: Vec<GpuSlot>,
}

impl NodeView {
    pub fn occupied_slots(&self) -> usize {
        self.gpu_slots.iter().filter(|s| !s.is_free()).count()
    }
}

pub const NODE_READY: &str = "Ready";
pub const NODE_NOT_READY: &str = "NotReady";
