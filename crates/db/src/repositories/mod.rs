//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod alert_repo;
pub mod job_repo;
pub mod monitoring_log_repo;
pub mod reading_repo;
pub mod threshold_repo;

pub use alert_repo::AlertRepo;
pub use job_repo::JobRepo;
pub use monitoring_log_repo::MonitoringLogRepo;
pub use reading_repo::ReadingRepo;
pub use threshold_repo::ThresholdRepo;
