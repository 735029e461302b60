//! Job status classification

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::snapshot::JobRecord;

/// Dashboard status of a job.
///
/// `Failed` is the catch-all: it also covers succeeded, unknown and
/// zero-task jobs. All classification goes through [`resolve_job_status`]
/// so the buckets can be refined in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "Pending",
            JobStatus::Running => "Running",
            JobStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a job from its task-state counts.
///
/// Any active task makes the job `Running`; otherwise any pending task
/// makes it `Pending`; everything else is `Failed`.
pub fn resolve_job_status(job: &JobRecord) -> JobStatus {
    if job.count_tasks(|s| s.is_active_used()) > 0 {
        return JobStatus::Running;
    }
    if job.count_tasks(|s| s.is_pending()) > 0 {
        return JobStatus::Pending;
    }
    JobStatus::Failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{TaskRecord, TaskStatus};

    fn job_with(statuses: &[TaskStatus]) -> JobRecord {
        statuses
            .iter()
            .enumerate()
            .fold(JobRecord::new("j", "j", "default"), |job, (i, s)| {
                job.with_task(TaskRecord::new(format!("j-{}", i), *s))
            })
    }

    #[test]
    fn test_active_takes_precedence() {
        let job = job_with(&[TaskStatus::Running, TaskStatus::Pending]);
        assert_eq!(resolve_job_status(&job), JobStatus::Running);
    }

    #[test]
    fn test_pending_only() {
        let job = job_with(&[TaskStatus::Pending, TaskStatus::Pending]);
        assert_eq!(resolve_job_status(&job), JobStatus::Pending);
    }

    #[test]
    fn test_zero_tasks_is_failed() {
        let job = job_with(&[]);
        assert_eq!(resolve_job_status(&job), JobStatus::Failed);
    }

    #[test]
    fn test_terminal_tasks_are_failed() {
        let job = job_with(&[TaskStatus::Succeeded, TaskStatus::Unknown]);
        assert_eq!(resolve_job_status(&job), JobStatus::Failed);
    }

    #[test]
    fn test_releasing_counts_as_running() {
        let job = job_with(&[TaskStatus::Failed, TaskStatus::Releasing]);
        assert_eq!(resolve_job_status(&job), JobStatus::Running);
    }

    #[test]
    fn test_gated_and_pipelined_not_pending() {
        let job = job_with(&[TaskStatus::Gated, TaskStatus::Pipelined]);
        assert_eq!(resolve_job_status(&job), JobStatus::Failed);
    }

    #[test]
    fn test_order_independent() {
        let a = job_with(&[TaskStatus::Pending, TaskStatus::Bound, TaskStatus::Failed]);
        let b = job_with(&[TaskStatus::Failed, TaskStatus::Pending, TaskStatus::Bound]);
        assert_eq!(resolve_job_status(&a), resolve_job_status(&b));
    }
}
