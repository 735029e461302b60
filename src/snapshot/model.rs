//! Snapshot records - the scheduler state this crate reads
//!
//! These types mirror what the scheduler cache hands out: nodes with their
//! bound tasks, the flat queue table, and pod-group (job) records. They are
//! owned by the snapshot provider and never mutated by projections.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point-in-time read of scheduler state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    /// Nodes indexed by node id
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeRecord>,

    /// Queues indexed by queue id
    #[serde(default)]
    pub queues: BTreeMap<String, QueueRecord>,

    /// Jobs (pod-groups) indexed by job id
    #[serde(default)]
    pub jobs: BTreeMap<String, JobRecord>,
}

impl ClusterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.queues.is_empty() && self.jobs.is_empty()
    }
}

/// Raw resource quantity as reported upstream.
///
/// CPU is in cores, memory in bytes, GPU in devices (fractional for shared
/// GPUs). A negative value means "unbounded".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceQuantity {
    #[serde(default)]
    pub cpu: f64,

    #[serde(default)]
    pub memory: f64,

    #[serde(default)]
    pub gpu: f64,
}

impl ResourceQuantity {
    pub fn new(cpu: f64, memory: f64, gpu: f64) -> Self {
        Self { cpu, memory, gpu }
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// Upper bound on GPU devices per node; larger reported counts are corrupt
pub const MAX_NODE_GPUS: usize = 1024;

/// A cluster node and the tasks currently bound to it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,

    #[serde(default)]
    pub conditions: Vec<NodeCondition>,

    #[serde(default)]
    pub allocatable: ResourceQuantity,

    #[serde(default)]
    pub used: ResourceQuantity,

    /// Declared GPU device count (e.g. from the `nvidia.com/gpu.count` label)
    #[serde(rename = "gpuCount")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_gpus: Option<u32>,

    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

impl NodeRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// True when the node carries a `Ready` condition with status `"True"`
    pub fn is_ready(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.condition_type == NodeConditionType::Ready && c.status == "True")
    }

    /// Number of discrete GPU devices on this node.
    ///
    /// Uses the declared count when present, otherwise the whole devices in
    /// the allocatable quantity. Counts above [`MAX_NODE_GPUS`] or not finite
    /// are treated as corrupt and yield 0.
    pub fn gpu_count(&self) -> usize {
        if self.has_implausible_gpu_count() {
            return 0;
        }
        let raw = self.raw_gpu_count();
        if raw > 0.0 {
            raw as usize
        } else {
            0
        }
    }

    /// True when the reported device count cannot be a real node
    pub fn has_implausible_gpu_count(&self) -> bool {
        let raw = self.raw_gpu_count();
        raw.is_nan() || raw > MAX_NODE_GPUS as f64
    }

    fn raw_gpu_count(&self) -> f64 {
        match self.declared_gpus {
            Some(count) => f64::from(count),
            None => self.allocatable.gpu,
        }
    }

    pub fn with_condition(mut self, condition_type: NodeConditionType, ok: bool) -> Self {
        self.conditions.push(NodeCondition::new(condition_type, ok));
        self
    }

    pub fn with_gpus(mut self, count: u32) -> Self {
        self.declared_gpus = Some(count);
        self.allocatable.gpu = count as f64;
        self
    }

    pub fn with_task(mut self, task: TaskRecord) -> Self {
        self.tasks.push(task);
        self
    }
}

/// A condition reported on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeCondition {
    #[serde(rename = "type")]
    pub condition_type: NodeConditionType,

    /// "True", "False" or "Unknown"
    pub status: String,
}

impl NodeCondition {
    pub fn new(condition_type: NodeConditionType, ok: bool) -> Self {
        Self {
            condition_type,
            status: if ok { "True" } else { "False" }.to_string(),
        }
    }
}

/// Types of node conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeConditionType {
    Ready,
    MemoryPressure,
    DiskPressure,
    PIDPressure,
    NetworkUnavailable,
}

// ============================================================================
// Queues
// ============================================================================

/// A queue as stored in the flat queue table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueRecord {
    pub name: String,

    /// Parent queue id, empty for a top-level queue
    #[serde(default)]
    pub parent: String,

    #[serde(default)]
    pub priority: i32,

    #[serde(default)]
    pub quota: QueueQuota,

    /// Usage estimate from the usage store; only used as a fallback
    #[serde(default)]
    pub usage: ResourceQuantity,
}

impl QueueRecord {
    pub fn new(name: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_quota(mut self, quota: QueueQuota) -> Self {
        self.quota = quota;
        self
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_empty()
    }
}

/// Per-resource quota of a queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueQuota {
    #[serde(default)]
    pub cpu: ResourceQuota,

    #[serde(default)]
    pub memory: ResourceQuota,

    #[serde(default)]
    pub gpu: ResourceQuota,
}

impl QueueQuota {
    /// Guaranteed (deserved) share
    pub fn guaranteed(&self) -> ResourceQuantity {
        ResourceQuantity::new(self.cpu.quota, self.memory.quota, self.gpu.quota)
    }

    /// Hard limit
    pub fn limit(&self) -> ResourceQuantity {
        ResourceQuantity::new(self.cpu.limit, self.memory.limit, self.gpu.limit)
    }
}

/// Quota of a single resource kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceQuota {
    #[serde(default)]
    pub quota: f64,

    #[serde(default)]
    pub limit: f64,

    #[serde(rename = "overQuotaWeight")]
    #[serde(default)]
    pub over_quota_weight: f64,
}

impl ResourceQuota {
    pub fn new(quota: f64, limit: f64) -> Self {
        Self {
            quota,
            limit,
            over_quota_weight: 0.0,
        }
    }
}

// ============================================================================
// Jobs and tasks
// ============================================================================

/// A pod-group: one unit of scheduling work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub uid: String,

    pub name: String,

    #[serde(default)]
    pub namespace: String,

    /// Owning queue id, empty when not submitted to a queue
    #[serde(default)]
    pub queue: String,

    /// Defaults to the Unix epoch when absent
    #[serde(rename = "creationTimestamp")]
    #[serde(default)]
    pub creation_timestamp: DateTime<Utc>,

    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

impl JobRecord {
    pub fn new(
        uid: impl Into<String>,
        name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            namespace: namespace.into(),
            queue: String::new(),
            creation_timestamp: DateTime::<Utc>::default(),
            tasks: Vec::new(),
        }
    }

    pub fn in_queue(mut self, queue: impl Into<String>) -> Self {
        self.queue = queue.into();
        self
    }

    pub fn with_task(mut self, task: TaskRecord) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn count_tasks(&self, pred: impl Fn(TaskStatus) -> bool) -> usize {
        self.tasks.iter().filter(|t| pred(t.status)).count()
    }
}

/// One schedulable workload instance
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,

    #[serde(default)]
    pub status: TaskStatus,

    /// Assigned node, empty when unscheduled
    #[serde(rename = "nodeName")]
    #[serde(default)]
    pub node_name: String,

    /// GPU assignment tokens, normally one device index per entry
    #[serde(rename = "gpuGroups")]
    #[serde(default)]
    pub gpu_groups: Vec<String>,

    #[serde(rename = "resourceRequest")]
    #[serde(default)]
    pub resource_request: ResourceQuantity,
}

impl TaskRecord {
    pub fn new(name: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            name: name.into(),
            status,
            ..Default::default()
        }
    }

    pub fn on_node(mut self, node: impl Into<String>) -> Self {
        self.node_name = node.into();
        self
    }

    pub fn with_gpu_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gpu_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_request(mut self, request: ResourceQuantity) -> Self {
        self.resource_request = request;
        self
    }
}

/// Lifecycle status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    Gated,
    Pipelined,
    Allocated,
    Binding,
    Bound,
    Running,
    Releasing,
    Succeeded,
    Failed,
    Unknown,
}

impl TaskStatus {
    /// Statuses that count as consuming node and queue resources
    pub fn is_active_used(self) -> bool {
        matches!(
            self,
            TaskStatus::Allocated
                | TaskStatus::Binding
                | TaskStatus::Bound
                | TaskStatus::Running
                | TaskStatus::Releasing
        )
    }

    pub fn is_pending(self) -> bool {
        self == TaskStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Gated => "Gated",
            TaskStatus::Pipelined => "Pipelined",
            TaskStatus::Allocated => "Allocated",
            TaskStatus::Binding => "Binding",
            TaskStatus::Bound => "Bound",
            TaskStatus::Running => "Running",
            TaskStatus::Releasing => "Releasing",
            TaskStatus::Succeeded => "Succeeded",
            TaskStatus::Failed => "Failed",
            TaskStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_ready_condition() {
        let ready = NodeRecord::new("n1").with_condition(NodeConditionType::Ready, true);
        assert!(ready.is_ready());

        let not_ready = NodeRecord::new("n2").with_condition(NodeConditionType::Ready, false);
        assert!(!not_ready.is_ready());

        let pressured =
            NodeRecord::new("n3").with_condition(NodeConditionType::MemoryPressure, true);
        assert!(!pressured.is_ready());

        assert!(!NodeRecord::new("n4").is_ready());
    }

    #[test]
    fn test_gpu_count_prefers_declared() {
        let mut node = NodeRecord::new("n1");
        node.allocatable.gpu = 4.0;
        assert_eq!(node.gpu_count(), 4);

        node.declared_gpus = Some(8);
        assert_eq!(node.gpu_count(), 8);

        let mut unbounded = NodeRecord::new("n2");
        unbounded.allocatable.gpu = -1.0;
        assert_eq!(unbounded.gpu_count(), 0);
    }

    #[test]
    fn test_gpu_count_rejects_corrupt_values() {
        let mut huge = NodeRecord::new("n1");
        huge.allocatable.gpu = 1e30;
        assert_eq!(huge.gpu_count(), 0);
        assert!(huge.has_implausible_gpu_count());

        let mut infinite = NodeRecord::new("n2");
        infinite.allocatable.gpu = f64::INFINITY;
        assert_eq!(infinite.gpu_count(), 0);

        let mut nan = NodeRecord::new("n3");
        nan.allocatable.gpu = f64::NAN;
        assert_eq!(nan.gpu_count(), 0);
        assert!(nan.has_implausible_gpu_count());

        let declared = NodeRecord::new("n4").with_gpus(u32::MAX);
        assert_eq!(declared.gpu_count(), 0);
        assert!(declared.has_implausible_gpu_count());

        let at_cap = NodeRecord::new("n5").with_gpus(MAX_NODE_GPUS as u32);
        assert_eq!(at_cap.gpu_count(), MAX_NODE_GPUS);
        assert!(!at_cap.has_implausible_gpu_count());

        let mut unbounded = NodeRecord::new("n6");
        unbounded.allocatable.gpu = -1.0;
        assert!(!unbounded.has_implausible_gpu_count());
    }

    #[test]
    fn test_snapshot_is_empty() {
        let mut snapshot = ClusterSnapshot::new();
        assert!(snapshot.is_empty());
        snapshot
            .queues
            .insert("root".into(), QueueRecord::new("root", ""));
        assert!(!snapshot.is_empty());
    }

    #[test]
    fn test_job_builder_timestamp_is_epoch() {
        let a = JobRecord::new("j1", "train", "ml");
        let b = JobRecord::new("j1", "train", "ml");
        assert_eq!(a.creation_timestamp, DateTime::<Utc>::default());
        assert_eq!(a.creation_timestamp, b.creation_timestamp);
    }

    #[test]
    fn test_active_used_statuses() {
        assert!(TaskStatus::Running.is_active_used());
        assert!(TaskStatus::Releasing.is_active_used());
        assert!(TaskStatus::Bound.is_active_used());
        assert!(!TaskStatus::Pending.is_active_used());
        assert!(!TaskStatus::Pipelined.is_active_used());
        assert!(!TaskStatus::Succeeded.is_active_used());
        assert!(TaskStatus::Pending.is_pending());
        assert!(!TaskStatus::Gated.is_pending());
    }

    #[test]
    fn test_snapshot_deserialize_defaults() {
        let json = r#"{
            "nodes": {
                "node-a": {
                    "name": "node-a",
                    "conditions": [{"type": "Ready", "status": "True"}],
                    "gpuCount": 2
                }
            },
            "jobs": {
                "job-1": {
                    "uid": "job-1",
                    "name": "train",
                    "tasks": [{"name": "train-0", "status": "Running", "gpuGroups": ["0"]}]
                }
            }
        }"#;

        let snapshot: ClusterSnapshot = serde_json::from_str(json).unwrap();
        assert!(snapshot.queues.is_empty());
        assert_eq!(snapshot.nodes["node-a"].gpu_count(), 2);
        assert!(snapshot.nodes["node-a"].is_ready());

        let job = &snapshot.jobs["job-1"];
        assert_eq!(job.queue, "");
        assert_eq!(job.tasks[0].status, TaskStatus::Running);
        assert_eq!(job.tasks[0].gpu_groups, vec!["0".to_string()]);
    }

    #[test]
    fn test_task_status_display() {
        assert_eq!(TaskStatus::Running.to_string(), "Running");
        assert_eq!(TaskStatus::Pipelined.to_string(), "Pipelined");
    }
}
