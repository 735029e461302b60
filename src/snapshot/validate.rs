//! Snapshot validation
//!
//! Reports data the projections tolerate but silently work around: dangling
//! queue parents, parent cycles, corrupt GPU counts, GPU tokens the slot
//! mapper skips, and tasks bound to nodes missing from the snapshot. Nothing
//! here is fatal.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::model::{ClusterSnapshot, MAX_NODE_GPUS};
use crate::projection::gpu::slot_for_token;

/// A non-fatal finding about a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotWarning {
    /// Queue references a parent that is not in the queue table
    DanglingParent { queue: String, parent: String },

    /// Queue's ancestor chain loops back on itself
    ParentCycle { queue: String },

    /// Node reports a GPU count no real node has; it is shown with no slots
    ImplausibleGpuCount { node: String, count: String },

    /// GPU token that does not name a single in-range device
    UnmappedGpuToken {
        node: String,
        task: String,
        token: String,
    },

    /// Job task assigned to a node that is not in the snapshot
    UnknownNode { job: String, task: String, node: String },
}

impl fmt::Display for SnapshotWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotWarning::DanglingParent { queue, parent } => write!(
                f,
                "queue '{}' references missing parent '{}' (shown as top-level)",
                queue, parent
            ),
            SnapshotWarning::ParentCycle { queue } => {
                write!(f, "queue '{}' is part of a parent cycle", queue)
            }
            SnapshotWarning::ImplausibleGpuCount { node, count } => write!(
                f,
                "node '{}' reports {} GPUs (limit {}); shown with no GPU slots",
                node, count, MAX_NODE_GPUS
            ),
            SnapshotWarning::UnmappedGpuToken { node, task, token } => write!(
                f,
                "task '{}' on node '{}' has GPU token '{}' that maps to no slot",
                task, node, token
            ),
            SnapshotWarning::UnknownNode { job, task, node } => write!(
                f,
                "task '{}' of job '{}' is assigned to unknown node '{}'",
                task, job, node
            ),
        }
    }
}

/// Collect warnings for a snapshot, in a stable order
pub fn validate_snapshot(snapshot: &ClusterSnapshot) -> Vec<SnapshotWarning> {
    let mut warnings = Vec::new();

    for (id, queue) in &snapshot.queues {
        if !queue.parent.is_empty() && !snapshot.queues.contains_key(&queue.parent) {
            warnings.push(SnapshotWarning::DanglingParent {
                queue: id.clone(),
                parent: queue.parent.clone(),
            });
        }
    }

    for id in parent_cycle_members(snapshot) {
        warnings.push(SnapshotWarning::ParentCycle { queue: id.to_string() });
    }

    for (node_id, node) in &snapshot.nodes {
        if node.has_implausible_gpu_count() {
            let count = match node.declared_gpus {
                Some(declared) => declared.to_string(),
                None => node.allocatable.gpu.to_string(),
            };
            warnings.push(SnapshotWarning::ImplausibleGpuCount {
                node: node_id.clone(),
                count,
            });
        }

        let slots = node.gpu_count();
        for task in node.tasks.iter().filter(|t| t.status.is_active_used()) {
            for token in &task.gpu_groups {
                if slot_for_token(token, slots).is_none() {
                    warnings.push(SnapshotWarning::UnmappedGpuToken {
                        node: node_id.clone(),
                        task: task.name.clone(),
                        token: token.clone(),
                    });
                }
            }
        }
    }

    for (job_id, job) in &snapshot.jobs {
        for task in &job.tasks {
            if !task.node_name.is_empty() && !snapshot.nodes.contains_key(&task.node_name) {
                warnings.push(SnapshotWarning::UnknownNode {
                    job: job_id.clone(),
                    task: task.name.clone(),
                    node: task.node_name.clone(),
                });
            }
        }
    }

    warnings
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    /// On the walk in progress, at this position of the path
    OnPath(usize),
    Done,
}

/// Queues whose parent chain loops back to themselves, in id order.
///
/// Each queue is walked at most once; queues that merely lead into a loop
/// are not members.
fn parent_cycle_members(snapshot: &ClusterSnapshot) -> BTreeSet<&str> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(snapshot.queues.len());
    let mut members = BTreeSet::new();
    let mut path: Vec<&str> = Vec::new();

    for start in snapshot.queues.keys() {
        let mut current = Some(start.as_str());
        while let Some(id) = current {
            match marks.get(id) {
                Some(Mark::Done) => break,
                Some(&Mark::OnPath(pos)) => {
                    members.extend(path[pos..].iter().copied());
                    break;
                }
                None => {
                    marks.insert(id, Mark::OnPath(path.len()));
                    path.push(id);
                    let parent = snapshot.queues[id].parent.as_str();
                    current = if parent.is_empty() {
                        None
                    } else {
                        snapshot
                            .queues
                            .get_key_value(parent)
                            .map(|(key, _)| key.as_str())
                    };
                }
            }
        }
        for id in path.drain(..) {
            marks.insert(id, Mark::Done);
        }
    }

    members
}
