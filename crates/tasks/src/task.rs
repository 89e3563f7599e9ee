//! Task records, states, and snapshots.

use serde::Serialize;

use petpal_core::error::CoreError;
use petpal_core::manifest::ModelManifest;
use petpal_core::types::{DbId, Timestamp};

/// Kind of work a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskKind {
    #[serde(rename = "3d_model_generation")]
    ModelGeneration,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelGeneration => f.write_str("3d_model_generation"),
        }
    }
}

/// Input parameters for a generation task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskParams {
    /// Text prompt for text-to-3D mode.
    pub prompt: Option<String>,
    /// Image URL for image-to-3D mode.
    pub image_url: Option<String>,
    /// Owning pet, if the task was submitted for one.
    pub pet_id: Option<DbId>,
}

impl TaskParams {
    /// Reject invalid parameter combinations before anything is enqueued.
    ///
    /// Exactly one of `prompt` / `image_url` must be provided (and
    /// non-blank); the two generation modes are mutually exclusive.
    pub fn validate(&self) -> Result<(), CoreError> {
        let has_prompt = is_present(&self.prompt);
        let has_image = is_present(&self.image_url);

        match (has_prompt, has_image) {
            (false, false) => Err(CoreError::Validation(
                "Either a prompt or an image URL is required".to_string(),
            )),
            (true, true) => Err(CoreError::Validation(
                "Prompt and image URL are mutually exclusive".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

fn is_present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Coarse task status exposed to polling clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Timeout,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
        }
    }

    /// Whether this status is absorbing (no transition leaves it).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Timeout)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle state.
///
/// Each variant carries only the data valid for that state, so a
/// "completed task without a result" cannot be represented.
#[derive(Debug, Clone)]
pub enum TaskState {
    Pending,
    Processing,
    Completed { manifest: ModelManifest },
    Failed { error: String },
    TimedOut,
}

impl TaskState {
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Pending => TaskStatus::Pending,
            Self::Processing => TaskStatus::Processing,
            Self::Completed { .. } => TaskStatus::Completed,
            Self::Failed { .. } => TaskStatus::Failed,
            Self::TimedOut => TaskStatus::Timeout,
        }
    }
}

/// One registered task.
///
/// Mutated only through [`crate::registry::TaskRegistry`], which enforces
/// the absorbing-terminal and monotonic-progress invariants.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub id: String,
    pub kind: TaskKind,
    pub params: TaskParams,
    pub state: TaskState,
    /// 0–100; non-decreasing until a terminal state.
    pub progress: u8,
    /// Human-readable description of the current processing step.
    pub detail: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
}

impl TaskRecord {
    /// A fresh pending record, created at submission time.
    pub fn new(id: String, kind: TaskKind, params: TaskParams) -> Self {
        Self {
            id,
            kind,
            params,
            state: TaskState::Pending,
            progress: 0,
            detail: None,
            created_at: chrono::Utc::now(),
            started_at: None,
            ended_at: None,
        }
    }
}

/// Point-in-time view of a task, safe to hand to HTTP clients.
///
/// Built atomically under the registry lock: `result` is present iff the
/// status is `completed`, `error` iff `failed`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub task_id: String,
    pub task_type: TaskKind,
    pub status: TaskStatus,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ModelManifest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskSnapshot {
    pub fn of(record: &TaskRecord) -> Self {
        let (result, error) = match &record.state {
            TaskState::Completed { manifest } => (Some(manifest.clone()), None),
            TaskState::Failed { error } => (None, Some(error.clone())),
            _ => (None, None),
        };

        Self {
            task_id: record.id.clone(),
            task_type: record.kind,
            status: record.state.status(),
            progress: record.progress,
            detail: record.detail.clone(),
            created_at: record.created_at,
            started_at: record.started_at,
            ended_at: record.ended_at,
            result,
            error,
        }
    }
}
