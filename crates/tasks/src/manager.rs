//! Task manager: submission front door, FIFO queue, and the single
//! background worker.
//!
//! Created once at application startup via [`TaskManager::start`] and
//! handed to the HTTP layer through shared state. Submissions never block
//! on task execution; the worker drains the queue strictly in submission
//! order and processes one generation at a time.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use petpal_core::error::CoreError;

use crate::bridge::PetBridge;
use crate::materialize::Materializer;
use crate::pipeline::{GenerationError, GenerationPipeline, PipelineConfig};
use crate::registry::TaskRegistry;
use crate::service::ModelJobService;
use crate::task::{TaskKind, TaskParams, TaskRecord, TaskSnapshot};

/// How long shutdown waits for the worker before abandoning it.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Construction-time settings for the task manager.
#[derive(Debug, Clone)]
pub struct TaskManagerConfig {
    /// Interval between vendor status polls.
    pub poll_interval: Duration,
    /// Wall-clock budget for the vendor wait of a single task.
    pub poll_budget: Duration,
    /// Directory materialized model files are written under.
    pub storage_dir: PathBuf,
}

/// One queued unit of work, carrying its own copy of the parameters so
/// the worker can proceed even if the registry record was swept.
struct QueuedTask {
    task_id: String,
    params: TaskParams,
}

/// In-process task orchestration service.
pub struct TaskManager {
    registry: Arc<TaskRegistry>,
    queue_tx: mpsc::UnboundedSender<QueuedTask>,
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl TaskManager {
    /// Spawn the worker and return a shared handle.
    pub fn start(
        service: Arc<dyn ModelJobService>,
        bridge: Arc<dyn PetBridge>,
        config: TaskManagerConfig,
    ) -> Arc<Self> {
        let registry = Arc::new(TaskRegistry::new());
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let pipeline = GenerationPipeline::new(
            Arc::clone(&registry),
            service,
            bridge,
            Materializer::new(config.storage_dir.clone()),
            PipelineConfig {
                poll_interval: config.poll_interval,
                poll_budget: config.poll_budget,
            },
        );

        let worker = tokio::spawn(run_worker(
            Arc::clone(&registry),
            pipeline,
            queue_rx,
            cancel.clone(),
        ));

        tracing::info!(
            poll_interval_ms = config.poll_interval.as_millis() as u64,
            poll_budget_secs = config.poll_budget.as_secs(),
            storage_dir = %config.storage_dir.display(),
            "Task manager started",
        );

        Arc::new(Self {
            registry,
            queue_tx,
            worker: Mutex::new(Some(worker)),
            cancel,
        })
    }

    /// Submit a generation task.
    ///
    /// Validates the parameters, registers the task as pending, enqueues
    /// it, and returns the fresh task id immediately. Invalid parameter
    /// combinations are rejected here and never reach the registry.
    pub async fn submit(&self, params: TaskParams) -> Result<String, CoreError> {
        params.validate()?;

        let task_id = uuid::Uuid::new_v4().to_string();
        let record = TaskRecord::new(task_id.clone(), TaskKind::ModelGeneration, params.clone());
        self.registry.register(record).await;

        if self
            .queue_tx
            .send(QueuedTask {
                task_id: task_id.clone(),
                params,
            })
            .is_err()
        {
            // Only possible once the worker has shut down.
            self.registry
                .fail(&task_id, "task queue is closed".to_string())
                .await;
            return Err(CoreError::Internal("task queue is closed".to_string()));
        }

        tracing::info!(task_id = %task_id, "Task submitted");
        Ok(task_id)
    }

    /// Snapshot of a task, or `None` for unknown/swept ids.
    pub async fn snapshot(&self, task_id: &str) -> Option<TaskSnapshot> {
        self.registry.snapshot(task_id).await
    }

    /// Progress update from the active worker. Silent no-op for unknown
    /// ids.
    pub async fn update_progress(&self, task_id: &str, percent: u8, detail: Option<&str>) {
        self.registry.update_progress(task_id, percent, detail).await;
    }

    /// Purge task records older than `max_age`, returning how many were
    /// deleted.
    pub async fn sweep_older_than(&self, max_age: chrono::Duration) -> usize {
        self.registry.sweep_older_than(max_age).await
    }

    /// Number of live task records.
    pub async fn task_count(&self) -> usize {
        self.registry.len().await
    }

    /// Stop the worker: cancel, then wait up to [`SHUTDOWN_GRACE`] for a
    /// clean exit before abandoning any in-flight generation.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down task manager");
        self.cancel.cancel();

        if let Some(handle) = self.worker.lock().await.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, handle).await.is_err() {
                tracing::warn!("Task worker did not stop in time, abandoning in-flight work");
            }
        }

        tracing::info!("Task manager shut down complete");
    }
}

/// Worker loop: drain the queue FIFO, one task at a time.
///
/// Every per-task error is caught and recorded on the task; nothing a
/// single task does can terminate this loop.
async fn run_worker(
    registry: Arc<TaskRegistry>,
    pipeline: GenerationPipeline,
    mut queue_rx: mpsc::UnboundedReceiver<QueuedTask>,
    cancel: CancellationToken,
) {
    tracing::info!("Task worker started");

    loop {
        let queued = tokio::select! {
            _ = cancel.cancelled() => break,
            item = queue_rx.recv() => match item {
                Some(item) => item,
                None => break,
            },
        };

        let task_id = queued.task_id;
        tracing::info!(task_id = %task_id, "Processing task");

        if !registry.begin_processing(&task_id).await {
            // Swept while still queued. The parameters travelled with the
            // queue item, so the generation itself still runs; its result
            // writes will be no-ops.
            tracing::warn!(task_id = %task_id, "Task missing from registry, result will be discarded");
        }

        match pipeline.run(&task_id, &queued.params).await {
            Ok(manifest) => {
                registry.complete(&task_id, manifest).await;
                tracing::info!(task_id = %task_id, "Task completed");
            }
            Err(GenerationError::TimedOut) => {
                registry.time_out(&task_id).await;
                tracing::warn!(task_id = %task_id, "Task timed out waiting for vendor");
            }
            Err(GenerationError::Vendor(message)) => {
                tracing::error!(task_id = %task_id, error = %message, "Task failed");
                registry.fail(&task_id, message).await;
            }
            Err(e) => {
                tracing::error!(task_id = %task_id, error = %e, "Task failed");
                registry.fail(&task_id, e.to_string()).await;
            }
        }
    }

    tracing::info!("Task worker stopped");
}
