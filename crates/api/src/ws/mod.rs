//! WebSocket infrastructure for real-time monitoring pushes.
//!
//! Provides connection management, heartbeat monitoring, the event-bus
//! forwarder, and the HTTP upgrade handler used by Axum routes.

mod forwarder;
mod handler;
mod heartbeat;
pub mod manager;

pub use forwarder::start_forwarder;
pub use handler::ws_handler;
pub use heartbeat::start_heartbeat;
pub use manager::WsManager;
