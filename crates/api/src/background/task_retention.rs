//! Periodic cleanup of old task records.
//!
//! Spawns a background task that purges in-memory task records older
//! than the configured retention period, regardless of their status.
//! Runs on a fixed interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use petpal_tasks::TaskManager;

/// How often the cleanup job runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the task retention loop until `cancel` is triggered.
///
/// A task still pending or processing can be purged too; the worker's
/// later writes for it become silent no-ops.
pub async fn run(tasks: Arc<TaskManager>, retention_days: i64, cancel: CancellationToken) {
    tracing::info!(
        retention_days,
        interval_secs = SWEEP_INTERVAL.as_secs(),
        "Task retention job started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Task retention job stopping");
                break;
            }
            _ = interval.tick() => {
                let removed = tasks
                    .sweep_older_than(chrono::Duration::days(retention_days))
                    .await;
                if removed > 0 {
                    let remaining = tasks.task_count().await;
                    tracing::info!(removed, remaining, "Task retention: purged old tasks");
                } else {
                    tracing::debug!("Task retention: no tasks to purge");
                }
            }
        }
    }
}
