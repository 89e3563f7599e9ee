//! In-memory task registry.
//!
//! A single mutex guards the whole map: the HTTP layer reads snapshots and
//! registers submissions, the one background worker writes state
//! transitions, and the retention sweep deletes old records. Terminal
//! states are absorbing and progress is monotonic; both invariants are
//! enforced here rather than trusted to callers.

use std::collections::HashMap;

use tokio::sync::Mutex;

use petpal_core::manifest::ModelManifest;

use crate::task::{TaskRecord, TaskSnapshot, TaskState};

/// Shared registry of all live task records.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<String, TaskRecord>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly submitted task.
    pub async fn register(&self, record: TaskRecord) {
        self.tasks.lock().await.insert(record.id.clone(), record);
    }

    /// Point-in-time snapshot of a task, or `None` for unknown/swept ids.
    pub async fn snapshot(&self, task_id: &str) -> Option<TaskSnapshot> {
        self.tasks.lock().await.get(task_id).map(TaskSnapshot::of)
    }

    /// Number of live task records.
    pub async fn len(&self) -> usize {
        self.tasks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.lock().await.is_empty()
    }

    /// Transition a task to `Processing` and stamp its start time.
    ///
    /// Returns `false` if the task is unknown (swept before the worker
    /// reached it) or already terminal; the worker proceeds either way and
    /// its later writes become no-ops.
    pub async fn begin_processing(&self, task_id: &str) -> bool {
        let mut tasks = self.tasks.lock().await;
        match tasks.get_mut(task_id) {
            Some(record) if !record.state.status().is_terminal() => {
                record.state = TaskState::Processing;
                record.started_at = Some(chrono::Utc::now());
                true
            }
            _ => false,
        }
    }

    /// Update progress and optional detail for a live task.
    ///
    /// Silent no-op for unknown or terminal tasks. Progress is clamped to
    /// 100 and never decreases.
    pub async fn update_progress(&self, task_id: &str, percent: u8, detail: Option<&str>) {
        let mut tasks = self.tasks.lock().await;
        if let Some(record) = tasks.get_mut(task_id) {
            if record.state.status().is_terminal() {
                return;
            }
            record.progress = record.progress.max(percent.min(100));
            if let Some(detail) = detail {
                record.detail = Some(detail.to_string());
            }
        }
    }

    /// Record a successful completion.
    ///
    /// The manifest is committed together with the status flip in one
    /// locked write, so a snapshot can never observe `completed` without
    /// its result.
    pub async fn complete(&self, task_id: &str, manifest: ModelManifest) {
        self.finish(task_id, TaskState::Completed { manifest }, Some(100))
            .await;
    }

    /// Record a failure with the captured error message.
    pub async fn fail(&self, task_id: &str, error: String) {
        self.finish(task_id, TaskState::Failed { error }, None).await;
    }

    /// Record a vendor-wait timeout.
    pub async fn time_out(&self, task_id: &str) {
        self.finish(task_id, TaskState::TimedOut, None).await;
    }

    async fn finish(&self, task_id: &str, state: TaskState, progress: Option<u8>) {
        let mut tasks = self.tasks.lock().await;
        match tasks.get_mut(task_id) {
            Some(record) if !record.state.status().is_terminal() => {
                record.state = state;
                record.ended_at = Some(chrono::Utc::now());
                if let Some(progress) = progress {
                    record.progress = progress;
                }
            }
            Some(record) => {
                tracing::debug!(
                    task_id = %task_id,
                    status = %record.state.status(),
                    "Ignoring state write to terminal task",
                );
            }
            None => {
                tracing::debug!(task_id = %task_id, "Ignoring state write to unknown task");
            }
        }
    }

    /// Delete tasks created before `now - max_age`, regardless of status.
    ///
    /// Returns the number of deleted records. A task still being processed
    /// can be swept; the worker's subsequent writes are silent no-ops.
    pub async fn sweep_older_than(&self, max_age: chrono::Duration) -> usize {
        let cutoff = chrono::Utc::now() - max_age;
        let mut tasks = self.tasks.lock().await;
        let before = tasks.len();
        tasks.retain(|task_id, record| {
            let keep = record.created_at >= cutoff;
            if !keep {
                tracing::debug!(task_id = %task_id, status = %record.state.status(), "Sweeping old task");
            }
            keep
        });
        before - tasks.len()
    }
}
