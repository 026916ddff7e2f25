//! Route definitions for the `/readings` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::readings;
use crate::state::AppState;

/// Routes mounted at `/readings`.
///
/// ```text
/// POST   /    -> ingest_reading (202, monitoring runs detached)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(readings::ingest_reading))
}
