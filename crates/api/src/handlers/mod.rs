//! HTTP request handlers, grouped by resource.

pub mod alerts;
pub mod jobs;
pub mod monitoring;
pub mod readings;
pub mod thresholds;
