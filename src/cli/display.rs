//! Display formatting for CLI output
//!
//! SBIO pattern: Pure functions that format data for display

use super::commands::ValidationReport;
use crate::projection::{ClusterSummary, JobView, NodeView, QueueView, ResourceStats};

// ============================================================================
// Table formatting helpers
// ============================================================================

/// Format a simple table with headers and rows
pub fn format_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    if rows.is_empty() {
        return "No resources found.\n".to_string();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();
    push_row(&mut output, headers.iter().map(|h| h.to_uppercase()), &widths);
    for row in rows {
        push_row(&mut output, row.into_iter(), &widths);
    }
    output
}

fn push_row(output: &mut String, cells: impl Iterator<Item = String>, widths: &[usize]) {
    let mut line = String::new();
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            line.push_str("   ");
        }
        match widths.get(i) {
            Some(&width) => line.push_str(&format!("{:width$}", cell, width = width)),
            None => line.push_str(&cell),
        }
    }
    output.push_str(line.trim_end());
    output.push('\n');
}

/// Format a byte count with binary units (e.g. "16Gi")
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["", "Ki", "Mi", "Gi", "Ti"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 || value.fract() == 0.0 {
        format!("{}{}", value as i64, UNITS[unit])
    } else {
        format!("{:.1}{}", value, UNITS[unit])
    }
}

/// Format milli-CPU: whole cores bare, otherwise in millicores
pub fn format_cpu(milli_cpu: i64) -> String {
    if milli_cpu % 1000 == 0 {
        (milli_cpu / 1000).to_string()
    } else {
        format!("{}m", milli_cpu)
    }
}

fn format_stats(stats: &ResourceStats) -> String {
    format!(
        "cpu={} mem={} gpu={}",
        format_cpu(stats.milli_cpu),
        format_bytes(stats.memory),
        stats.gpu
    )
}

// ============================================================================
// Summary display
// ============================================================================

/// Format the cluster summary
pub fn format_summary(summary: &ClusterSummary) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Nodes:   {}/{} ready\n",
        summary.healthy_nodes, summary.total_nodes
    ));
    output.push_str(&format!(
        "GPUs:    {}/{} allocated\n",
        summary.allocated_gpus, summary.total_gpus
    ));
    output.push_str(&format!("Queues:  {}\n", summary.total_queues));

    if summary.job_counts.is_empty() {
        output.push_str("Jobs:    none\n");
    } else {
        output.push_str("Jobs:\n");
        for (status, count) in &summary.job_counts {
            output.push_str(&format!("  {:10} {}\n", status, count));
        }
    }
    output
}

// ============================================================================
// Queue display
// ============================================================================

/// Format the queue forest as an indented tree table
pub fn format_queue_tree(queues: &[QueueView]) -> String {
    let headers = &["QUEUE", "WEIGHT", "GUARANTEED", "ALLOCATED", "MAX"];
    let mut rows = Vec::new();

    // Explicit stack: hierarchies can be arbitrarily deep
    let mut stack: Vec<(&QueueView, usize)> = queues.iter().rev().map(|q| (q, 0)).collect();
    while let Some((queue, depth)) = stack.pop() {
        rows.push(vec![
            format!("{}{}", "  ".repeat(depth), queue.name),
            queue.weight.to_string(),
            format_stats(&queue.resources.guaranteed),
            format_stats(&queue.resources.allocated),
            format_stats(&queue.resources.max),
        ]);
        stack.extend(queue.children.iter().rev().map(|c| (c, depth + 1)));
    }

    format_table(headers, rows)
}

// ============================================================================
// Job display
// ============================================================================

/// Format job list for display
pub fn format_job_list(jobs: &[JobView]) -> String {
    let headers = &["NAMESPACE", "NAME", "QUEUE", "STATUS", "TASKS", "CREATED"];
    let rows: Vec<Vec<String>> = jobs
        .iter()
        .map(|job| {
            let placed = job.tasks.iter().filter(|t| !t.node_name.is_empty()).count();
            vec![
                job.namespace.clone(),
                job.name.clone(),
                job.queue.clone(),
                job.status.clone(),
                format!("{}/{}", placed, job.tasks.len()),
                job.create_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        })
        .collect();

    format_table(headers, rows)
}

// ============================================================================
// Node display
// ============================================================================

/// Format node list for display
pub fn format_node_list(nodes: &[NodeView]) -> String {
    let headers = &["NAME", "STATUS", "CPU", "MEMORY", "GPUS", "SLOTS"];
    let rows: Vec<Vec<String>> = nodes
        .iter()
        .map(|node| {
            vec![
                node.name.clone(),
                node.status.clone(),
                format!(
                    "{}/{}",
                    format_cpu(node.used.milli_cpu),
                    format_cpu(node.allocatable.milli_cpu)
                ),
                format!(
                    "{}/{}",
                    format_bytes(node.used.memory),
                    format_bytes(node.allocatable.memory)
                ),
                format!("{}/{}", node.occupied_slots(), node.gpu_slots.len()),
                format_slot_map(node),
            ]
        })
        .collect();

    format_table(headers, rows)
}

/// One character per GPU slot: '#' occupied, 'x' fragmented, '.' free
pub fn format_slot_map(node: &NodeView) -> String {
    node.gpu_slots
        .iter()
        .map(|slot| {
            if !slot.is_free() {
                '#'
            } else if slot.fragmented {
                'x'
            } else {
                '.'
            }
        })
        .collect()
}

// ============================================================================
// Validation display
// ============================================================================

/// Format a snapshot validation report
pub fn format_validation(source: &str, report: &ValidationReport) -> String {
    let mut output = format!(
        "{}: {} nodes, {} queues, {} jobs\n",
        source, report.nodes, report.queues, report.jobs
    );
    if report.is_clean() {
        output.push_str("Snapshot is valid\n");
    } else {
        output.push_str(&format!("{} warning(s):\n", report.warnings.len()));
        for warning in &report.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }
    output
}
