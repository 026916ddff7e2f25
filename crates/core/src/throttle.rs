//! TTL-based throttle for expensive analysis scheduling.
//!
//! Keyed by `(check kind, building id)`. A present, unexpired entry means
//! "already scheduled recently"; expiry is purely time-based, there is no
//! explicit deletion. The current time is always passed in so tests can
//! simulate the clock.

use std::collections::HashMap;

use chrono::Duration;

use crate::types::{DbId, Timestamp};

/// The kinds of deferred analysis the monitoring trigger may schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckKind {
    AnomalyDetection,
    EfficiencyAnalysis,
    MaintenancePrediction,
}

impl CheckKind {
    /// Scheduling cadence: how long after a successful scheduling decision
    /// the same check stays throttled for the same building.
    pub fn cadence(self) -> Duration {
        match self {
            CheckKind::AnomalyDetection => Duration::hours(1),
            CheckKind::EfficiencyAnalysis => Duration::hours(24),
            CheckKind::MaintenancePrediction => Duration::hours(24),
        }
    }
}

type ThrottleKey = (CheckKind, DbId);

/// Short-TTL scheduling throttle. Wrap in a mutex to share.
#[derive(Debug, Default)]
pub struct ThrottleCache {
    scheduled_at: HashMap<ThrottleKey, Timestamp>,
}

impl ThrottleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a scheduling decision for this key is still within its
    /// cadence window.
    pub fn is_throttled(&self, kind: CheckKind, building_id: DbId, now: Timestamp) -> bool {
        match self.scheduled_at.get(&(kind, building_id)) {
            Some(at) => now.signed_duration_since(*at) < kind.cadence(),
            None => false,
        }
    }

    /// Record a successful scheduling decision for this key.
    ///
    /// Callers record only after the job row is actually written; a failed
    /// insert leaves the key absent so the next reading can retry. Expired
    /// entries are replaced in place.
    pub fn record(&mut self, kind: CheckKind, building_id: DbId, now: Timestamp) {
        self.scheduled_at.insert((kind, building_id), now);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
