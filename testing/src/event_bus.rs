//! In-memory event bus for tests.

use auth_session_core::event::SerializedEvent;
use auth_session_core::event_bus::{EventBus, EventBusError, EventStream};
use futures::stream;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

type Published = (String, SerializedEvent);

/// Event bus that records every published event and fans it out to subscribers.
///
/// Subscribers only see events published after they subscribed.
#[derive(Debug, Clone)]
pub struct InMemoryEventBus {
    published: Arc<Mutex<Vec<Published>>>,
    sender: broadcast::Sender<Published>,
    fail_publishes: Arc<AtomicBool>,
}

impl InMemoryEventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            published: Arc::new(Mutex::new(Vec::new())),
            sender,
            fail_publishes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every publish fail (events are not recorded).
    pub fn set_publish_failure(&self, fail: bool) {
        self.fail_publishes.store(fail, Ordering::SeqCst);
    }

    /// Every event published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<SerializedEvent> {
        self.records().iter().map(|(_, event)| event.clone()).collect()
    }

    /// Events published to `topic`.
    #[must_use]
    pub fn published_to(&self, topic: &str) -> Vec<SerializedEvent> {
        self.records()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Events with the given type.
    #[must_use]
    pub fn events_of_type(&self, event_type: &str) -> Vec<SerializedEvent> {
        self.records()
            .iter()
            .filter(|(_, event)| event.event_type == event_type)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Number of events with the given type.
    #[must_use]
    pub fn count_of(&self, event_type: &str) -> usize {
        self.events_of_type(event_type).len()
    }

    /// Forget everything published so far.
    pub fn clear(&self) {
        self.records().clear();
    }

    fn records(&self) -> MutexGuard<'_, Vec<Published>> {
        self.published.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus for InMemoryEventBus {
    fn publish(
        &self,
        topic: &str,
        event: &SerializedEvent,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let event = event.clone();

        Box::pin(async move {
            if self.fail_publishes.load(Ordering::SeqCst) {
                return Err(EventBusError::PublishFailed {
                    topic,
                    reason: "publishing disabled".to_string(),
                });
            }

            self.records().push((topic.clone(), event.clone()));
            // No subscribers is fine.
            let _ = self.sender.send((topic, event));
            Ok(())
        })
    }

    fn subscribe(
        &self,
        topics: &[&str],
    ) -> Pin<Box<dyn Future<Output = Result<EventStream, EventBusError>> + Send + '_>> {
        let topics: Vec<String> = topics.iter().map(ToString::to_string).collect();
        let receiver = self.sender.subscribe();

        Box::pin(async move {
            if topics.is_empty() {
                return Err(EventBusError::SubscriptionFailed {
                    topics,
                    reason: "no topics given".to_string(),
                });
            }

            let stream = stream::unfold(receiver, move |mut receiver| {
                let topics = topics.clone();
                async move {
                    loop {
                        match receiver.recv().await {
                            Ok((topic, event)) if topics.contains(&topic) => {
                                return Some((Ok(event), receiver));
                            }
                            Ok(_) => {}
                            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                                let error = EventBusError::TransportError(format!(
                                    "subscriber lagged by {skipped} events"
                                ));
                                return Some((Err(error), receiver));
                            }
                            Err(broadcast::error::RecvError::Closed) => return None,
                        }
                    }
                }
            });
            Ok(Box::pin(stream) as EventStream)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    #[allow(clippy::unwrap_used)]
    async fn test_publish_records_and_fans_out() {
        let bus = InMemoryEventBus::new();
        let mut stream = bus.subscribe(&["auth-events"]).await.unwrap();

        let event = SerializedEvent::new("USER_LOGGED_IN".to_string(), b"{}".to_vec(), None);
        bus.publish("other-events", &event).await.unwrap();
        bus.publish("auth-events", &event).await.unwrap();

        assert_eq!(bus.published().len(), 2);
        assert_eq!(bus.published_to("auth-events").len(), 1);
        assert_eq!(bus.count_of("USER_LOGGED_IN"), 2);

        let received = stream.next().await.unwrap().unwrap();
        assert_eq!(received.event_type, "USER_LOGGED_IN");
    }

    #[tokio::test]
    async fn test_subscribe_without_topics_fails() {
        let bus = InMemoryEventBus::new();

        let result = bus.subscribe(&[]).await;

        assert!(matches!(result, Err(EventBusError::SubscriptionFailed { .. })));
    }

    #[tokio::test]
    async fn test_publish_failure_is_not_recorded() {
        let bus = InMemoryEventBus::new();
        bus.set_publish_failure(true);

        let event = SerializedEvent::new("AUTH_ERROR".to_string(), Vec::new(), None);
        let result = bus.publish("auth-events", &event).await;

        assert!(matches!(result, Err(EventBusError::PublishFailed { .. })));
        assert!(bus.published().is_empty());
    }
}
