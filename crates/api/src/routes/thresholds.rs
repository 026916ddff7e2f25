//! Route definitions for the `/thresholds` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::thresholds;
use crate::state::AppState;

/// Routes mounted at `/thresholds`.
///
/// ```text
/// GET    /    -> list_thresholds
/// POST   /    -> create_threshold
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(thresholds::list_thresholds).post(thresholds::create_threshold),
    )
}
