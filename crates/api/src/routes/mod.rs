pub mod alerts;
pub mod health;
pub mod jobs;
pub mod monitoring;
pub mod readings;
pub mod thresholds;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                WebSocket (?building_id= filter)
///
/// /readings                          ingest (POST)
///
/// /alerts                            list, create
/// /alerts/{id}                       get, patch
/// /alerts/{id}/acknowledge           acknowledge (POST)
/// /alerts/{id}/resolve               resolve (POST)
///
/// /thresholds                        list, create
///
/// /jobs                              list (+ worker liveness), submit
/// /jobs/{id}                         get
///
/// /monitoring/logs                   recent monitoring pass logs (GET)
/// /monitoring/escalation-sweep       run one sweep now (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/readings", readings::router())
        .nest("/alerts", alerts::router())
        .nest("/thresholds", thresholds::router())
        .nest("/jobs", jobs::router())
        .nest("/monitoring", monitoring::router())
}
