use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::ws::RoomOutboundEvent;

/// Fan-out hub mapping room codes to broadcast channels.
///
/// The lifecycle engine only ever asks to "broadcast to room X"; which
/// connections that reaches is resolved here. Channels are created lazily on
/// the first subscription and removed again once the last receiver is gone.
pub struct RoomHub {
    channels: DashMap<String, broadcast::Sender<RoomOutboundEvent>>,
    capacity: usize,
}

impl RoomHub {
    /// Build a hub whose per-room channels buffer up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: DashMap::new(),
            capacity,
        }
    }

    /// Subscribe to a room's event stream, creating the channel if this is
    /// the room's first subscriber.
    pub fn subscribe(&self, code: &str) -> broadcast::Receiver<RoomOutboundEvent> {
        self.channels
            .entry(code.to_owned())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send an event to every subscriber of a room. Rooms without subscribers
    /// simply drop the event; delivery errors are ignored.
    pub fn broadcast(&self, code: &str, event: RoomOutboundEvent) {
        if let Some(sender) = self.channels.get(code) {
            let _ = sender.send(event);
        }
    }

    /// Drop a room's channel when its last subscriber has disconnected.
    pub fn prune(&self, code: &str) {
        self.channels
            .remove_if(code, |_, sender| sender.receiver_count() == 0);
    }

    /// Number of live subscribers for a room.
    pub fn subscriber_count(&self, code: &str) -> usize {
        self.channels
            .get(code)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generating(message: &str) -> RoomOutboundEvent {
        RoomOutboundEvent::QuizGenerating {
            message: message.to_owned(),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_room_events() {
        let hub = RoomHub::new(8);
        let mut rx = hub.subscribe("AAAAAA");

        hub.broadcast("AAAAAA", generating("warming up"));

        match rx.recv().await.unwrap() {
            RoomOutboundEvent::QuizGenerating { message } => assert_eq!(message, "warming up"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rooms_are_isolated() {
        let hub = RoomHub::new(8);
        let mut a = hub.subscribe("AAAAAA");
        let _b = hub.subscribe("BBBBBB");

        hub.broadcast("BBBBBB", generating("elsewhere"));

        assert!(matches!(
            a.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn broadcast_without_subscribers_is_dropped() {
        let hub = RoomHub::new(8);
        hub.broadcast("AAAAAA", generating("nobody listening"));
        assert_eq!(hub.subscriber_count("AAAAAA"), 0);
    }

    #[tokio::test]
    async fn prune_removes_idle_channels_only() {
        let hub = RoomHub::new(8);
        let rx = hub.subscribe("AAAAAA");

        hub.prune("AAAAAA");
        assert_eq!(hub.subscriber_count("AAAAAA"), 1);

        drop(rx);
        hub.prune("AAAAAA");
        assert!(hub.channels.get("AAAAAA").is_none());
    }
}
