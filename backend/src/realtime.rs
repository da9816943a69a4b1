//! In-process realtime event fanout.
//!
//! Every connected WebSocket client subscribes to one broadcast channel;
//! events carry the room they belong to and subscribers drop events for
//! other rooms. Rooms are per enterprise, so clients only ever see their
//! own tenant's events.

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Default broadcast channel capacity. Slow subscribers that fall more
/// than this many events behind start losing the oldest ones.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Event name pushed when a notification is created
pub const EVENT_NEW_NOTIFICATION: &str = "newNotification";

#[derive(Debug, Clone, Serialize)]
pub struct RealtimeEvent {
    pub room: String,
    pub event: String,
    pub payload: serde_json::Value,
}

#[derive(Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<RealtimeEvent>,
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Room name for an enterprise's event stream
    pub fn room_for_enterprise(enterprise_id: Uuid) -> String {
        format!("enterprise_{}", enterprise_id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.sender.subscribe()
    }

    /// Publish an event into an enterprise's room. Delivery is best effort:
    /// with no subscribers the event is dropped silently.
    pub fn publish(&self, enterprise_id: Uuid, event: &str, payload: &impl Serialize) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("Failed to serialize realtime payload: {}", err);
                return;
            }
        };

        let _ = self.sender.send(RealtimeEvent {
            room: Self::room_for_enterprise(enterprise_id),
            event: event.to_string(),
            payload,
        });
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}
