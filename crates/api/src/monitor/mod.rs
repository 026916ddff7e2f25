//! Monitoring pipeline entry point.
//!
//! [`trigger::spawn_monitoring`] runs the evaluate/alert/schedule/notify
//! sequence for one stored reading as a detached task, so the ingestion
//! request returns before any of that work happens.

pub mod trigger;

pub use trigger::spawn_monitoring;
