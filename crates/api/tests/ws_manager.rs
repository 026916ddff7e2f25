//! Unit tests for `WsManager`.
//!
//! These tests exercise the WebSocket connection manager directly, without
//! performing any HTTP upgrades. They verify add/remove semantics,
//! channel-filtered delivery, and graceful shutdown behaviour.

use axum::extract::ws::Message;

use gridmon_api::ws::WsManager;
use gridmon_events::{MonitoringEvent, EVENT_ENERGY_UPDATE, EVENT_SYSTEM_MONITORING_UPDATE};

#[tokio::test]
async fn new_manager_has_zero_connections() {
    let manager = WsManager::new();

    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn add_and_remove_track_connection_count() {
    let manager = WsManager::new();

    let _rx = manager.add("conn-1".to_string(), None).await;
    assert_eq!(manager.connection_count().await, 1);

    manager.remove("conn-1").await;
    assert_eq!(manager.connection_count().await, 0);

    // Removing an unknown ID is a no-op.
    manager.remove("nonexistent").await;
    assert_eq!(manager.connection_count().await, 0);
}

#[tokio::test]
async fn deliver_respects_building_filter() {
    let manager = WsManager::new();

    let mut rx_b1 = manager.add("conn-b1".to_string(), Some(1)).await;
    let mut rx_b2 = manager.add("conn-b2".to_string(), Some(2)).await;
    let mut rx_all = manager.add("conn-all".to_string(), None).await;

    let event = MonitoringEvent::building(1, EVENT_ENERGY_UPDATE, serde_json::json!({}));
    let delivered = manager.deliver(&event).await;

    // Building 1 subscriber and the unfiltered subscriber only.
    assert_eq!(delivered, 2);
    assert!(rx_b1.try_recv().is_ok());
    assert!(rx_b2.try_recv().is_err());
    assert!(rx_all.try_recv().is_ok());
}

#[tokio::test]
async fn global_events_reach_every_connection() {
    let manager = WsManager::new();

    let mut rx_b1 = manager.add("conn-b1".to_string(), Some(1)).await;
    let mut rx_all = manager.add("conn-all".to_string(), None).await;

    let event =
        MonitoringEvent::global(EVENT_SYSTEM_MONITORING_UPDATE, serde_json::json!({}));
    let delivered = manager.deliver(&event).await;

    assert_eq!(delivered, 2);
    assert!(rx_b1.try_recv().is_ok());
    assert!(rx_all.try_recv().is_ok());
}

#[tokio::test]
async fn delivered_frames_are_serialized_events() {
    let manager = WsManager::new();
    let mut rx = manager.add("conn-1".to_string(), Some(7)).await;

    let event = MonitoringEvent::building(
        7,
        EVENT_ENERGY_UPDATE,
        serde_json::json!({"consumption_kwh": 42.0}),
    );
    manager.deliver(&event).await;

    let Some(Message::Text(text)) = rx.recv().await else {
        panic!("expected a text frame");
    };
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(json["event"], EVENT_ENERGY_UPDATE);
    assert_eq!(json["payload"]["consumption_kwh"], 42.0);
}

#[tokio::test]
async fn shutdown_sends_close_and_clears() {
    let manager = WsManager::new();

    let mut rx = manager.add("conn-1".to_string(), None).await;
    manager.shutdown_all().await;

    assert_eq!(manager.connection_count().await, 0);
    assert!(matches!(rx.recv().await, Some(Message::Close(None))));
}

#[tokio::test]
async fn ping_all_reaches_every_connection() {
    let manager = WsManager::new();

    let mut rx1 = manager.add("conn-1".to_string(), Some(1)).await;
    let mut rx2 = manager.add("conn-2".to_string(), None).await;

    manager.ping_all().await;

    assert!(matches!(rx1.recv().await, Some(Message::Ping(_))));
    assert!(matches!(rx2.recv().await, Some(Message::Ping(_))));
}
