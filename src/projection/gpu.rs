//! GPU slot occupancy
//!
//! Rebuilds per-device occupancy from the GPU assignment tokens carried by
//! active tasks. Only single-index tokens are understood; compound tokens
//! such as `"0,1"` and anything else unparseable are skipped without error.

use serde::{Deserialize, Serialize};

use crate::snapshot::NodeRecord;

/// One GPU device on a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuSlot {
    /// Device index, 0..gpu_count
    #[serde(rename = "id")]
    pub index: usize,

    /// Occupying task names joined with "," (empty when free)
    #[serde(rename = "occupiedBy")]
    pub occupied_by: String,

    /// Idle but unusable due to topology constraints
    pub fragmented: bool,
}

impl GpuSlot {
    fn free(index: usize, fragmented: bool) -> Self {
        Self {
            index,
            occupied_by: String::new(),
            fragmented,
        }
    }

    pub fn is_free(&self) -> bool {
        self.occupied_by.is_empty()
    }

    fn occupy(&mut self, task: &str) {
        if !self.occupied_by.is_empty() {
            self.occupied_by.push(',');
        }
        self.occupied_by.push_str(task);
    }
}

/// Parse a GPU assignment token as a single device index
pub fn parse_gpu_token(token: &str) -> Option<usize> {
    token.parse::<usize>().ok()
}

/// Slot index named by `token`, if it is in range for `slot_count` devices
pub fn slot_for_token(token: &str, slot_count: usize) -> Option<usize> {
    parse_gpu_token(token).filter(|&idx| idx < slot_count)
}

/// Topology-aware fragmentation is not computed; every slot reports false.
pub fn is_fragmented(_node: &NodeRecord, _index: usize) -> bool {
    false
}

/// Build the ordered slot list for a node.
///
/// Length always equals the node's GPU count. Tasks that are not in an
/// active state occupy nothing; shared slots list every occupant in task
/// order.
pub fn map_slots(node: &NodeRecord) -> Vec<GpuSlot> {
    let count = node.gpu_count();
    let mut slots: Vec<GpuSlot> = (0..count)
        .map(|i| GpuSlot::free(i, is_fragmented(node, i)))
        .collect();

    for task in node.tasks.iter().filter(|t| t.status.is_active_used()) {
        for token in &task.gpu_groups {
            if let Some(idx) = slot_for_token(token, count) {
                slots[idx].occupy(&task.name);
            }
        }
    }

    slots
}
