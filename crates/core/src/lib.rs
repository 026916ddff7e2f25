//! Domain logic for the gridmon monitoring pipeline.
//!
//! Everything in this crate is pure: no database access, no network I/O.
//! The api crate wires these pieces to sqlx repositories and the event bus.

pub mod alert;
pub mod error;
pub mod evaluator;
pub mod job;
pub mod reading;
pub mod throttle;
pub mod types;
