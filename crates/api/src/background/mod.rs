//! Background jobs spawned at server startup.

pub mod task_retention;
