//! End-to-end generation pipeline for one task.
//!
//! Submit the vendor job, poll it at a fixed interval under a wall-clock
//! budget, materialize the result files, and reflect the outcome onto the
//! owning pet. Runs entirely on the single worker task.

use std::sync::Arc;
use std::time::Duration;

use petpal_core::manifest::ModelManifest;

use crate::bridge::PetBridge;
use crate::materialize::{MaterializeError, Materializer};
use crate::registry::TaskRegistry;
use crate::service::{JobInput, JobPoll, ModelJobService};
use crate::task::TaskParams;

/// Interval between vendor status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Wall-clock budget for the vendor wait, measured from when polling
/// begins. Exceeding it yields Timeout, not Failed.
pub const DEFAULT_POLL_BUDGET: Duration = Duration::from_secs(300);

/// Terminal outcome of one pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The vendor rejected or errored on submission.
    #[error("vendor submission failed: {0}")]
    Submit(String),

    /// The vendor reported the job as failed.
    #[error("{0}")]
    Vendor(String),

    /// Result files could not be materialized.
    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    /// The polling budget elapsed before the vendor finished. The vendor
    /// job may still complete later; we just stop waiting for it.
    #[error("vendor polling budget exceeded")]
    TimedOut,
}

/// Pipeline timing knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub poll_interval: Duration,
    pub poll_budget: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_budget: DEFAULT_POLL_BUDGET,
        }
    }
}

/// Drives one task from vendor submission to a normalized manifest.
pub struct GenerationPipeline {
    registry: Arc<TaskRegistry>,
    service: Arc<dyn ModelJobService>,
    bridge: Arc<dyn PetBridge>,
    materializer: Materializer,
    config: PipelineConfig,
}

impl GenerationPipeline {
    pub fn new(
        registry: Arc<TaskRegistry>,
        service: Arc<dyn ModelJobService>,
        bridge: Arc<dyn PetBridge>,
        materializer: Materializer,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            service,
            bridge,
            materializer,
            config,
        }
    }

    /// Run the full generation flow for one task.
    ///
    /// Pet status callbacks fire exactly once per outcome from inside this
    /// method; the caller records the matching task state afterwards.
    pub async fn run(
        &self,
        task_id: &str,
        params: &TaskParams,
    ) -> Result<ModelManifest, GenerationError> {
        let input = JobInput {
            prompt: params.prompt.clone(),
            image_url: params.image_url.clone(),
        };

        let job_id = match self.service.submit(&input).await {
            Ok(job_id) => job_id,
            Err(e) => {
                self.notify_failed(params).await;
                return Err(GenerationError::Submit(e.to_string()));
            }
        };

        tracing::info!(task_id = %task_id, job_id = %job_id, "Vendor job submitted");
        self.registry
            .update_progress(task_id, 10, Some("vendor job submitted"))
            .await;

        if let Some(pet_id) = params.pet_id {
            self.bridge.mark_generating(pet_id).await;
        }

        let (files, preview) = match self.poll_until_done(task_id, &job_id).await {
            Ok(result) => result,
            Err(e) => {
                match &e {
                    GenerationError::TimedOut => self.notify_timed_out(params).await,
                    _ => self.notify_failed(params).await,
                }
                return Err(e);
            }
        };

        self.registry
            .update_progress(task_id, 90, Some("materializing result files"))
            .await;

        match self
            .materializer
            .materialize(&job_id, params.pet_id, &files, preview.as_deref())
            .await
        {
            Ok(manifest) => {
                if let Some(pet_id) = params.pet_id {
                    self.bridge.apply_completed(pet_id, &manifest).await;
                }
                Ok(manifest)
            }
            Err(e) => {
                self.notify_failed(params).await;
                Err(e.into())
            }
        }
    }

    /// Poll the vendor until the job reaches a terminal state or the
    /// budget elapses.
    ///
    /// Transient query failures are retried on the next tick; only a
    /// vendor-reported failure ends the job early.
    async fn poll_until_done(
        &self,
        task_id: &str,
        job_id: &str,
    ) -> Result<(Vec<petpal_core::manifest::RemoteFile>, Option<String>), GenerationError> {
        let started = tokio::time::Instant::now();

        loop {
            if started.elapsed() >= self.config.poll_budget {
                tracing::warn!(
                    task_id = %task_id,
                    job_id = %job_id,
                    budget_secs = self.config.poll_budget.as_secs(),
                    "Vendor wait exceeded budget",
                );
                return Err(GenerationError::TimedOut);
            }

            match self.service.poll(job_id).await {
                Ok(JobPoll::Done {
                    files,
                    preview_image_url,
                }) => {
                    tracing::info!(task_id = %task_id, job_id = %job_id, "Vendor job done");
                    return Ok((files, preview_image_url));
                }
                Ok(JobPoll::Failed { message }) => {
                    tracing::error!(task_id = %task_id, job_id = %job_id, error = %message, "Vendor job failed");
                    return Err(GenerationError::Vendor(message));
                }
                Ok(JobPoll::Running { progress }) => {
                    // Map vendor progress into the 10..90 band between
                    // submission and materialization.
                    let percent = progress
                        .map(|p| 10 + (u16::from(p.min(100)) * 80 / 100) as u8)
                        .unwrap_or(10);
                    self.registry
                        .update_progress(task_id, percent, Some("waiting for vendor"))
                        .await;
                }
                Err(e) => {
                    tracing::warn!(
                        task_id = %task_id,
                        job_id = %job_id,
                        error = %e,
                        "Vendor status query failed, will retry",
                    );
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn notify_failed(&self, params: &TaskParams) {
        if let Some(pet_id) = params.pet_id {
            self.bridge.mark_failed(pet_id).await;
        }
    }

    async fn notify_timed_out(&self, params: &TaskParams) {
        if let Some(pet_id) = params.pet_id {
            self.bridge.mark_timed_out(pet_id).await;
        }
    }
}
