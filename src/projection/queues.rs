//! Queue hierarchy reconstruction
//!
//! The queue table is flat: each record names its parent by id. Building the
//! tree runs in explicit passes over an index so no view is reached through
//! a possibly-cyclic pointer graph:
//!
//! 1. Index every queue id and create its view with direct usage.
//! 2. Link each view to its parent by id lookup. A missing parent promotes
//!    the queue to the top level; a parent chain that loops back is cut where
//!    the walk re-enters the loop.
//! 3. Walk each tree in post-order and add every child's accumulated
//!    `allocated` into its parent.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::resources::{to_stats, ResourceStats};
use crate::snapshot::{JobRecord, QueueRecord};

/// Direct usage per queue id
pub type QueueUsage = BTreeMap<String, ResourceStats>;

/// Guaranteed / allocated / max resources of a queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueResources {
    pub guaranteed: ResourceStats,
    pub allocated: ResourceStats,
    pub max: ResourceStats,
}

/// A queue and its sub-queues
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueView {
    pub name: String,

    /// Parent queue id as recorded, empty for a top-level queue
    pub parent: String,

    pub weight: i32,

    pub resources: QueueResources,

    pub children: Vec<QueueView>,
}

impl QueueView {
    /// Depth-first search for a queue by name, including `self`
    pub fn find(&self, name: &str) -> Option<&QueueView> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Number of queues in this subtree, including `self`
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(QueueView::subtree_len).sum::<usize>()
    }
}

/// Options for building the queue forest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueBuildOptions {
    /// Use a queue's usage estimate when no job reports usage for it
    #[serde(default)]
    pub usage_fallback: bool,
}

/// Sum active task requests per owning queue.
///
/// Jobs without a queue are left out of usage accounting entirely.
pub fn direct_usage<'a>(jobs: impl IntoIterator<Item = &'a JobRecord>) -> QueueUsage {
    let mut usage = QueueUsage::new();
    for job in jobs {
        if job.queue.is_empty() {
            continue;
        }
        let acc = usage.entry(job.queue.clone()).or_default();
        for task in job.tasks.iter().filter(|t| t.status.is_active_used()) {
            acc.accumulate(&to_stats(&task.resource_request));
        }
    }
    usage
}

/// Build the queue forest, ordered by queue id at every level.
pub fn build_queue_forest(
    queues: &BTreeMap<String, QueueRecord>,
    usage: &QueueUsage,
    options: QueueBuildOptions,
) -> Vec<QueueView> {
    let ids: Vec<&str> = queues.keys().map(String::as_str).collect();
    let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    let mut slots: Vec<Option<QueueView>> = queues
        .iter()
        .map(|(id, record)| Some(new_view(id, record, usage, options)))
        .collect();

    let mut parent_of: Vec<Option<usize>> = queues
        .iter()
        .map(|(id, record)| {
            if record.is_top_level() {
                return None;
            }
            let parent = index.get(record.parent.as_str()).copied();
            if parent.is_none() {
                debug!(
                    "Queue '{}' references missing parent '{}'; showing it as top-level",
                    id, record.parent
                );
            }
            parent
        })
        .collect();
    break_cycles(&ids, &mut parent_of);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); ids.len()];
    let mut roots = Vec::new();
    for (i, parent) in parent_of.iter().enumerate() {
        match parent {
            Some(p) => children[*p].push(i),
            None => roots.push(i),
        }
    }

    for i in post_order(&roots, &children) {
        let kids: Vec<QueueView> = children[i]
            .iter()
            .filter_map(|&c| slots[c].take())
            .collect();
        if let Some(view) = slots[i].as_mut() {
            for kid in &kids {
                view.resources.allocated.accumulate(&kid.resources.allocated);
            }
            view.children = kids;
        }
    }

    roots.into_iter().filter_map(|r| slots[r].take()).collect()
}

fn new_view(
    id: &str,
    record: &QueueRecord,
    usage: &QueueUsage,
    options: QueueBuildOptions,
) -> QueueView {
    let allocated = match usage.get(id) {
        Some(stats) => *stats,
        None if options.usage_fallback => to_stats(&record.usage),
        None => ResourceStats::default(),
    };

    QueueView {
        name: record.name.clone(),
        parent: record.parent.clone(),
        weight: record.priority,
        resources: QueueResources {
            guaranteed: to_stats(&record.quota.guaranteed()),
            allocated,
            max: to_stats(&record.quota.limit()),
        },
        children: Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnPath,
    Done,
}

/// Cut parent links that close a cycle, turning the re-entered queue into
/// a top-level queue.
fn break_cycles(ids: &[&str], parent_of: &mut [Option<usize>]) {
    let mut marks = vec![Mark::Unvisited; parent_of.len()];
    let mut path = Vec::new();

    for start in 0..parent_of.len() {
        let mut current = Some(start);
        while let Some(i) = current {
            match marks[i] {
                Mark::Done => break,
                Mark::OnPath => {
                    warn!(
                        "Queue '{}' closes a parent cycle; showing it as top-level",
                        ids[i]
                    );
                    parent_of[i] = None;
                    break;
                }
                Mark::Unvisited => {
                    marks[i] = Mark::OnPath;
                    path.push(i);
                    current = parent_of[i];
                }
            }
        }
        for i in path.drain(..) {
            marks[i] = Mark::Done;
        }
    }
}

/// Iterative post-order over the forest: every child precedes its parent.
fn post_order(roots: &[usize], children: &[Vec<usize>]) -> Vec<usize> {
    let mut order = Vec::with_capacity(children.len());
    let mut stack: Vec<(usize, bool)> = roots.iter().rev().map(|&r| (r, false)).collect();

    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
            continue;
        }
        stack.push((node, true));
        for &child in children[node].iter().rev() {
            stack.push((child, false));
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{QueueQuota, ResourceQuantity, ResourceQuota, TaskRecord, TaskStatus};

    fn queue(name: &str, parent: &str) -> QueueRecord {
        QueueRecord::new(name, parent)
    }

    fn table(records: Vec<QueueRecord>) -> BTreeMap<String, QueueRecord> {
        records.into_iter().map(|q| (q.name.clone(), q)).collect()
    }

    fn cpu_usage(entries: &[(&str, i64)]) -> QueueUsage {
        entries
            .iter()
            .map(|(id, cpu)| (id.to_string(), ResourceStats::new(*cpu, 0, 0)))
            .collect()
    }

    fn allocated_cpu(forest: &[QueueView], name: &str) -> i64 {
        forest
            .iter()
            .find_map(|q| q.find(name))
            .map(|q| q.resources.allocated.milli_cpu)
            .unwrap()
    }

    #[test]
    fn test_deep_chain_accumulates_bottom_up() {
        let queues = table(vec![
            queue("root", ""),
            queue("root.a", "root"),
            queue("root.a.b", "root.a"),
            queue("root.a.b.c", "root.a.b"),
        ]);
        let usage = cpu_usage(&[
            ("root", 1000),
            ("root.a", 1000),
            ("root.a.b", 1000),
            ("root.a.b.c", 1000),
        ]);

        let forest = build_queue_forest(&queues, &usage, QueueBuildOptions::default());
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].name, "root");
        assert_eq!(forest[0].children[0].name, "root.a");
        assert_eq!(forest[0].children[0].children[0].name, "root.a.b");
        assert_eq!(
            forest[0].children[0].children[0].children[0].name,
            "root.a.b.c"
        );

        assert_eq!(allocated_cpu(&forest, "root"), 4000);
        assert_eq!(allocated_cpu(&forest, "root.a"), 3000);
        assert_eq!(allocated_cpu(&forest, "root.a.b"), 2000);
        assert_eq!(allocated_cpu(&forest, "root.a.b.c"), 1000);
    }

    #[test]
    fn test_siblings_summed_independently() {
        let queues = table(vec![
            queue("root", ""),
            queue("x", "root"),
            queue("y", "root"),
        ]);
        let mut usage = QueueUsage::new();
        usage.insert("x".into(), ResourceStats::new(500, 100, 1));
        usage.insert("y".into(), ResourceStats::new(250, 50, 2));

        let forest = build_queue_forest(&queues, &usage, QueueBuildOptions::default());
        assert_eq!(
            forest[0].resources.allocated,
            ResourceStats::new(750, 150, 3)
        );
        let names: Vec<&str> = forest[0].children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn test_dangling_parent_promoted_to_root() {
        let queues = table(vec![queue("root", ""), queue("orphan", "missing-parent")]);
        let forest = build_queue_forest(&queues, &QueueUsage::new(), QueueBuildOptions::default());

        assert_eq!(forest.len(), 2);
        let orphan = forest.iter().find(|q| q.name == "orphan").unwrap();
        assert_eq!(orphan.parent, "missing-parent");
        assert!(orphan.children.is_empty());
    }

    #[test]
    fn test_cycle_is_broken_and_every_queue_kept() {
        let queues = table(vec![queue("a", "b"), queue("b", "a"), queue("c", "a")]);
        let usage = cpu_usage(&[("a", 1), ("b", 10), ("c", 100)]);

        let forest = build_queue_forest(&queues, &usage, QueueBuildOptions::default());
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].name, "a");
        assert_eq!(forest[0].subtree_len(), 3);
        assert_eq!(allocated_cpu(&forest, "a"), 111);
    }

    #[test]
    fn test_self_parent_is_top_level() {
        let queues = table(vec![queue("loop", "loop")]);
        let forest = build_queue_forest(&queues, &QueueUsage::new(), QueueBuildOptions::default());
        assert_eq!(forest.len(), 1);
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn test_very_deep_chain_does_not_recurse() {
        let depth = 50_000;
        let mut records = vec![queue("q0", "")];
        for i in 1..depth {
            records.push(queue(&format!("q{}", i), &format!("q{}", i - 1)));
        }
        let queues = table(records);
        let usage: QueueUsage = queues
            .keys()
            .map(|id| (id.clone(), ResourceStats::new(1, 0, 0)))
            .collect();

        let forest = build_queue_forest(&queues, &usage, QueueBuildOptions::default());
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].resources.allocated.milli_cpu, depth as i64);

        // Dropping a deeply nested Vec<QueueView> recurses; unwind iteratively.
        let mut pending = forest;
        while let Some(mut view) = pending.pop() {
            pending.append(&mut view.children);
        }
    }

    #[test]
    fn test_quota_conversion_and_clamping() {
        let quota = QueueQuota {
            cpu: ResourceQuota::new(10.0, -1.0),
            memory: ResourceQuota::new(1024.0, -1.0),
            gpu: ResourceQuota::new(1.0, 4.0),
        };
        let queues = table(vec![queue("root", "").with_quota(quota).with_priority(100)]);

        let forest = build_queue_forest(&queues, &QueueUsage::new(), QueueBuildOptions::default());
        let root = &forest[0];
        assert_eq!(root.weight, 100);
        assert_eq!(root.resources.guaranteed, ResourceStats::new(10_000, 1024, 1));
        assert_eq!(root.resources.max, ResourceStats::new(0, 0, 4));
        assert!(root.resources.allocated.is_zero());
    }

    #[test]
    fn test_usage_fallback() {
        let mut idle = queue("idle", "");
        idle.usage = ResourceQuantity::new(2.0, 0.0, 1.0);
        let mut busy = queue("busy", "");
        busy.usage = ResourceQuantity::new(9.0, 0.0, 0.0);
        let queues = table(vec![idle, busy]);
        let usage = cpu_usage(&[("busy", 500)]);

        let off = build_queue_forest(&queues, &usage, QueueBuildOptions::default());
        assert!(off.iter().find(|q| q.name == "idle").unwrap().resources.allocated.is_zero());

        let on = build_queue_forest(&queues, &usage, QueueBuildOptions { usage_fallback: true });
        let idle = on.iter().find(|q| q.name == "idle").unwrap();
        assert_eq!(idle.resources.allocated, ResourceStats::new(2000, 0, 1));
        assert_eq!(allocated_cpu(&on, "busy"), 500);
    }

    #[test]
    fn test_direct_usage_counts_active_tasks_only() {
        let request = ResourceQuantity::new(1.0, 512.0, 1.0);
        let jobs = vec![
            JobRecord::new("j1", "j1", "default")
                .in_queue("team-a")
                .with_task(TaskRecord::new("j1-0", TaskStatus::Running).with_request(request))
                .with_task(TaskRecord::new("j1-1", TaskStatus::Pending).with_request(request)),
            JobRecord::new("j2", "j2", "default")
                .in_queue("team-a")
                .with_task(TaskRecord::new("j2-0", TaskStatus::Bound).with_request(request)),
            JobRecord::new("j3", "j3", "default")
                .with_task(TaskRecord::new("j3-0", TaskStatus::Running).with_request(request)),
        ];

        let usage = direct_usage(&jobs);
        assert_eq!(usage.len(), 1);
        assert_eq!(usage["team-a"], ResourceStats::new(2000, 1024, 2));
    }

    #[test]
    fn test_empty_input() {
        let forest = build_queue_forest(
            &BTreeMap::new(),
            &QueueUsage::new(),
            QueueBuildOptions::default(),
        );
        assert!(forest.is_empty());
    }
}
