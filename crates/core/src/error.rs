//! Domain error type shared across the workspace.

use crate::types::DbId;

/// Domain-level errors. HTTP mapping lives in the api crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// An entity lookup by id found nothing.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed or out-of-range input. Never retried.
    #[error("{0}")]
    Validation(String),

    /// A uniqueness or duplicate-definition conflict.
    #[error("{0}")]
    Conflict(String),

    /// An operation attempted from a state that does not permit it,
    /// e.g. acknowledging an already-resolved alert.
    #[error("{0}")]
    InvalidState(String),

    /// Anything unexpected. The message is logged but not exposed to clients.
    #[error("{0}")]
    Internal(String),
}
