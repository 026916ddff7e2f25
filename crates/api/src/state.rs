use std::sync::{Arc, Mutex};

use gridmon_core::throttle::ThrottleCache;
use gridmon_events::EventBus;

use crate::config::ServerConfig;
use crate::engine::WorkerStatus;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: gridmon_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Centralized event bus for publishing monitoring events.
    pub event_bus: Arc<EventBus>,
    /// Scheduling throttle shared between the trigger and its tests.
    /// Locked only for short synchronous lookups.
    pub throttle: Arc<Mutex<ThrottleCache>>,
    /// Job worker liveness, reported alongside job listings.
    pub worker_status: Arc<WorkerStatus>,
}
