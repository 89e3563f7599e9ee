//! REST client for the Hunyuan image/text → 3D generation service.
//!
//! The service is an asynchronous job pair: submit a generation request
//! (text prompt XOR image) to obtain a job id, then poll that id until
//! the job reports done or failed.

mod client;
mod request;

pub use client::{HunyuanClient, HunyuanConfig, HunyuanError, JobStatus, QueryJobResponse};
pub use request::{is_private_network_url, truncate_prompt, SubmitJobRequest, MAX_PROMPT_CHARS};
