//! # Cluster projections
//!
//! Turns one scheduler snapshot into the four read-only views a dashboard
//! shows: the cluster summary, the queue tree, the job listing and per-node
//! GPU occupancy.
//!
//! ```text
//!                  SnapshotSource::snapshot()
//!                             │
//!                   ┌─────────▼─────────┐
//!                   │ ProjectionService │
//!                   └─────────┬─────────┘
//!     ┌──────────────┬────────┴───────┬───────────────┐
//!     ▼              ▼                ▼               ▼
//!  summary        queues            jobs            nodes
//!  (status)   (queues+resources)  (status)    (resources+gpu)
//! ```
//!
//! Everything below the service is a pure function of the snapshot.

pub mod gpu;
pub mod queues;
pub mod resources;
pub mod service;
pub mod status;
pub mod views;

pub use gpu::{map_slots, parse_gpu_token, slot_for_token, GpuSlot};
pub use queues::{
    build_queue_forest, direct_usage, QueueBuildOptions, QueueResources, QueueUsage, QueueView,
};
pub use resources::{clamp_unbounded, to_stats, ResourceStats};
pub use service::ProjectionService;
pub use status::{resolve_job_status, JobStatus};
pub use views::{ClusterSummary, JobView, NodeView, TaskView};
