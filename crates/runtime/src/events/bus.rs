//! Topic-based event bus implementation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::types::{DeliveryEvent, DeviceEvent, ScheduleEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Discovery, selection and snapshots
    Device,
    /// Run lifecycle and scheduling passes
    Schedule,
    /// Drain progress and single sends
    Delivery,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Device, Topic::Schedule, Topic::Delivery];
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    Device(DeviceEvent),
    Schedule(ScheduleEvent),
    Delivery(DeliveryEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Device(_) => Topic::Device,
            Event::Schedule(_) => Topic::Schedule,
            Event::Delivery(_) => Topic::Delivery,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Clones share the same channels.
#[derive(Clone)]
pub struct EventBus {
    device: broadcast::Sender<Event>,
    schedule: broadcast::Sender<Event>,
    delivery: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            device: broadcast::channel(capacity).0,
            schedule: broadcast::channel(capacity).0,
            delivery: broadcast::channel(capacity).0,
        }
    }

    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Device => &self.device,
            Topic::Schedule => &self.schedule,
            Topic::Delivery => &self.delivery,
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if self.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::DeliveryEvent;

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::new();
        let mut delivery = bus.subscribe(Topic::Delivery);
        let mut device = bus.subscribe(Topic::Device);

        bus.publish(Event::Delivery(DeliveryEvent::DrainStarted { queued: 2 }));

        assert!(matches!(
            delivery.recv().await,
            Ok(Event::Delivery(DeliveryEvent::DrainStarted { queued: 2 }))
        ));
        assert!(device.try_recv().is_err());
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let bus = EventBus::with_capacity(4);
        bus.publish(Event::Delivery(DeliveryEvent::DrainFinished {
            delivered: 0,
            dropped: 0,
        }));
        assert_eq!(bus.subscribe_multiple(&Topic::ALL).len(), 3);
    }
}
