//! Gridmon event bus.
//!
//! Building blocks for real-time notification fan-out:
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`MonitoringEvent`]: the canonical event envelope, addressed to a
//!   per-building or global [`Channel`].

pub mod bus;

pub use bus::{
    Channel, EventBus, MonitoringEvent, EVENT_ALERT_ESCALATED, EVENT_ENERGY_UPDATE,
    EVENT_JOB_UPDATE, EVENT_MAINTENANCE_ALERT, EVENT_MONITORING_UPDATE,
    EVENT_POWER_QUALITY_UPDATE, EVENT_SYSTEM_MONITORING_UPDATE,
};
