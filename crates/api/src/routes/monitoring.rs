//! Route definitions for the `/monitoring` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::monitoring;
use crate::state::AppState;

/// Routes mounted at `/monitoring`.
///
/// ```text
/// GET    /logs                 -> list_logs
/// POST   /escalation-sweep     -> trigger_sweep
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/logs", get(monitoring::list_logs))
        .route("/escalation-sweep", post(monitoring::trigger_sweep))
}
