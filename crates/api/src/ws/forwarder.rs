use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;

use gridmon_events::EventBus;

use crate::ws::manager::WsManager;

/// Spawn the bus-to-socket forwarder.
///
/// Subscribes to the event bus and delivers each event to the matching
/// WebSocket connections. The task exits when the bus sender is dropped
/// (broadcast channel closed), which happens during shutdown.
pub fn start_forwarder(
    bus: &EventBus,
    ws_manager: Arc<WsManager>,
) -> tokio::task::JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let delivered = ws_manager.deliver(&event).await;
                    tracing::trace!(
                        event = %event.event,
                        delivered,
                        "Forwarded monitoring event"
                    );
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Best-effort push: clients re-fetch from the API.
                    tracing::warn!(skipped, "Event forwarder lagged, events dropped");
                }
                Err(RecvError::Closed) => {
                    tracing::info!("Event bus closed, forwarder stopping");
                    break;
                }
            }
        }
    })
}
