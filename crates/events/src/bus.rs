//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the hub the monitoring trigger and the escalation
//! sweeper publish to and the websocket layer subscribes to. Delivery is
//! best effort: the authoritative state always lives in the database, so a
//! client that misses a push can simply re-fetch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use gridmon_core::types::DbId;

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

/// Per-building: a monitoring pass finished (raw reading plus any alerts).
pub const EVENT_MONITORING_UPDATE: &str = "monitoringUpdate";
/// Per-building: an energy reading was processed.
pub const EVENT_ENERGY_UPDATE: &str = "energyUpdate";
/// Per-building: a power-quality reading was processed.
pub const EVENT_POWER_QUALITY_UPDATE: &str = "powerQualityUpdate";
/// Per-building: an equipment alert fired.
pub const EVENT_MAINTENANCE_ALERT: &str = "maintenanceAlert";
/// Global: any alert fired anywhere in the portfolio.
pub const EVENT_SYSTEM_MONITORING_UPDATE: &str = "systemMonitoringUpdate";
/// Per-building: an alert was escalated by the sweeper.
pub const EVENT_ALERT_ESCALATED: &str = "alertEscalated";
/// Per-building (global when the job has no building): a background job
/// reached a terminal state.
pub const EVENT_JOB_UPDATE: &str = "jobUpdate";

// ---------------------------------------------------------------------------
// MonitoringEvent
// ---------------------------------------------------------------------------

/// Addressing scope for a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "building_id", rename_all = "snake_case")]
pub enum Channel {
    /// Delivered to subscribers of one building's topic.
    Building(DbId),
    /// Delivered to every subscriber.
    Global,
}

impl Channel {
    /// True if a subscriber filtered to `building_id` should receive an
    /// event on this channel.
    pub fn matches(self, building_id: Option<DbId>) -> bool {
        match self {
            Channel::Global => true,
            Channel::Building(id) => building_id.map_or(true, |b| b == id),
        }
    }
}

/// A monitoring event pushed toward connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringEvent {
    /// Addressing scope: one building's topic or the global topic.
    pub channel: Channel,

    /// Event name, e.g. [`EVENT_MONITORING_UPDATE`].
    pub event: String,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl MonitoringEvent {
    /// Create an event on a building's topic.
    pub fn building(building_id: DbId, event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            channel: Channel::Building(building_id),
            event: event.into(),
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Create an event on the global topic.
    pub fn global(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            channel: Channel::Global,
            event: event.into(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`MonitoringEvent`]. Shared via
/// `Arc<EventBus>` across the application.
pub struct EventBus {
    sender: broadcast::Sender<MonitoringEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: MonitoringEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitoringEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(MonitoringEvent::building(
            42,
            EVENT_ENERGY_UPDATE,
            serde_json::json!({"consumption_kwh": 120.5}),
        ));

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.channel, Channel::Building(42));
        assert_eq!(received.event, EVENT_ENERGY_UPDATE);
        assert_eq!(received.payload["consumption_kwh"], 120.5);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(MonitoringEvent::global(
            EVENT_SYSTEM_MONITORING_UPDATE,
            serde_json::json!({}),
        ));

        let e1 = rx1.recv().await.expect("subscriber 1 should receive");
        let e2 = rx2.recv().await.expect("subscriber 2 should receive");

        assert_eq!(e1.event, EVENT_SYSTEM_MONITORING_UPDATE);
        assert_eq!(e2.event, EVENT_SYSTEM_MONITORING_UPDATE);
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(MonitoringEvent::global(EVENT_SYSTEM_MONITORING_UPDATE, serde_json::json!({})));
    }

    #[test]
    fn channel_matching_respects_building_filter() {
        assert!(Channel::Global.matches(Some(1)));
        assert!(Channel::Global.matches(None));
        assert!(Channel::Building(1).matches(Some(1)));
        assert!(!Channel::Building(1).matches(Some(2)));
        // An unfiltered subscriber sees everything.
        assert!(Channel::Building(1).matches(None));
    }
}
