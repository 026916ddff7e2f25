//! Shared response envelope types for API handlers.
//!
//! All API responses carry a `success` boolean: successful responses use
//! `{ "success": true, "data": ... }`, errors use
//! `{ "success": false, "error": ..., "code": ... }` (see [`crate::error`]).
//! Use [`DataResponse`] instead of ad-hoc `serde_json::json!` envelopes to
//! get compile-time type safety and consistent serialization.

use serde::Serialize;

/// Standard `{ "success": true, "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
