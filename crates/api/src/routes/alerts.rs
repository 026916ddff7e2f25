//! Route definitions for the `/alerts` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::alerts;
use crate::state::AppState;

/// Routes mounted at `/alerts`.
///
/// ```text
/// GET    /                    -> list_alerts
/// POST   /                    -> create_alert
/// GET    /{id}                -> get_alert
/// PATCH  /{id}                -> update_alert
/// POST   /{id}/acknowledge    -> acknowledge_alert
/// POST   /{id}/resolve        -> resolve_alert
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(alerts::list_alerts).post(alerts::create_alert))
        .route("/{id}", get(alerts::get_alert).patch(alerts::update_alert))
        .route("/{id}/acknowledge", post(alerts::acknowledge_alert))
        .route("/{id}/resolve", post(alerts::resolve_alert))
}
