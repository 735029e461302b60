pub mod model;
pub mod source;
pub mod validate;

pub use model::{
    ClusterSnapshot, JobRecord, NodeCondition, NodeConditionType, NodeRecord, QueueQuota,
    QueueRecord, ResourceQuantity, ResourceQuota, TaskRecord, TaskStatus, MAX_NODE_GPUS,
};
pub use source::{
    parse_snapshot, FileSnapshotSource, SnapshotError, SnapshotFormat, SnapshotSource,
    StaticSnapshotSource,
};
pub use validate::{validate_snapshot, SnapshotWarning};
