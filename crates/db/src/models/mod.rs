//! Row models and DTOs for the monitoring schema.

pub mod alert;
pub mod job;
pub mod monitoring_log;
pub mod reading;
pub mod status;
pub mod threshold;
