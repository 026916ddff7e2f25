//! Background job execution engine.
//!
//! [`JobWorker`] is a single long-lived polling loop that claims pending
//! jobs and runs the handler registered for their type. [`WorkerStatus`]
//! exposes loop liveness to the API, distinct from per-job status.

pub mod handlers;
pub mod worker;

pub use handlers::{handler_registry, JobHandler};
pub use worker::{JobWorker, WorkerStatus, WorkerStatusSnapshot};
