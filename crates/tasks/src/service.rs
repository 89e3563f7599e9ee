//! Vendor job service seam.
//!
//! The pipeline talks to the 3D generation vendor through
//! [`ModelJobService`] so tests can script vendor behaviour. The
//! production implementation wraps [`HunyuanClient`].

use async_trait::async_trait;

use petpal_core::manifest::RemoteFile;
use petpal_hunyuan::{HunyuanClient, JobStatus, SubmitJobRequest};

/// Generation input forwarded to the vendor (already validated: exactly
/// one field is set).
#[derive(Debug, Clone)]
pub struct JobInput {
    pub prompt: Option<String>,
    pub image_url: Option<String>,
}

/// One poll observation of a vendor job.
#[derive(Debug, Clone)]
pub enum JobPoll {
    /// The job is queued or running.
    Running { progress: Option<u8> },
    /// The job finished; the manifest lists the produced files.
    Done {
        files: Vec<RemoteFile>,
        preview_image_url: Option<String>,
    },
    /// The vendor reported a terminal failure.
    Failed { message: String },
}

/// Errors from the vendor seam.
///
/// An `Err` from [`ModelJobService::poll`] means the *query* failed
/// (transient; retry), which is deliberately distinct from
/// [`JobPoll::Failed`] (the vendor says the job is dead).
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid job input: {0}")]
    InvalidInput(String),

    #[error("vendor request failed: {0}")]
    Transport(String),
}

/// Submit/poll pair for asynchronous vendor generation jobs.
#[async_trait]
pub trait ModelJobService: Send + Sync {
    /// Submit a job, returning the vendor job id.
    async fn submit(&self, input: &JobInput) -> Result<String, ServiceError>;

    /// Query the current state of a submitted job.
    async fn poll(&self, job_id: &str) -> Result<JobPoll, ServiceError>;
}

#[async_trait]
impl ModelJobService for HunyuanClient {
    async fn submit(&self, input: &JobInput) -> Result<String, ServiceError> {
        let request = match (&input.prompt, &input.image_url) {
            (Some(prompt), None) => SubmitJobRequest::from_prompt(prompt),
            (None, Some(url)) => self
                .prepare_image_request(url)
                .await
                .map_err(|e| ServiceError::Transport(e.to_string()))?,
            _ => {
                return Err(ServiceError::InvalidInput(
                    "exactly one of prompt or image_url is required".to_string(),
                ))
            }
        };

        self.submit_job(&request)
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))
    }

    async fn poll(&self, job_id: &str) -> Result<JobPoll, ServiceError> {
        let response = self
            .query_job(job_id)
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(match response.job_status() {
            JobStatus::Waiting | JobStatus::Running => JobPoll::Running {
                progress: response.progress,
            },
            JobStatus::Done => JobPoll::Done {
                files: response.remote_files(),
                preview_image_url: response.preview_image_url(),
            },
            JobStatus::Failed => JobPoll::Failed {
                message: response
                    .error_message
                    .unwrap_or_else(|| "vendor reported failure".to_string()),
            },
            JobStatus::Other(status) => JobPoll::Failed {
                message: format!("unexpected vendor status '{status}'"),
            },
        })
    }
}
