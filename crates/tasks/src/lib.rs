//! Asynchronous 3D-generation task orchestration.
//!
//! [`TaskManager`] owns an in-memory task registry and a FIFO work queue
//! drained by a single background worker. Submissions return a task id
//! immediately; HTTP handlers poll task snapshots while the worker drives
//! each job through the vendor, materializes the result files, and updates
//! the owning pet through the [`PetBridge`].
//!
//! Task state lives only in process memory; a restart loses all of it by
//! design. The durable copy of a finished generation is the pet row.

pub mod bridge;
pub mod manager;
pub mod materialize;
pub mod pipeline;
pub mod registry;
pub mod service;
pub mod task;

pub use bridge::{PetBridge, PgPetBridge};
pub use manager::{TaskManager, TaskManagerConfig};
pub use service::{JobInput, JobPoll, ModelJobService, ServiceError};
pub use task::{TaskKind, TaskParams, TaskSnapshot, TaskStatus};
