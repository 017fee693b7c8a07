//! Ordered event delivery to subscribers

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::DashboardEvent;

/// Handler trait for event handlers
///
/// A handler may subscribe or unsubscribe on the bus while handling an event. It must not
/// publish on the bus it is subscribed to.
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &DashboardEvent);
}

/// Identifies a subscription for [`EventBus::unsubscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type SharedHandler = Arc<Mutex<Box<dyn EventHandler>>>;

struct Subscription {
    id: SubscriptionId,
    handler: SharedHandler,
}

impl Subscription {
    fn new(id: SubscriptionId, handler: Box<dyn EventHandler>) -> Self {
        Self {
            id,
            handler: Arc::new(Mutex::new(handler)),
        }
    }
}

/// Dashboard event bus
///
/// Handlers run synchronously inside [`EventBus::publish`], in subscription order. Events
/// therefore reach every subscriber in publish order.
pub struct EventBus {
    /// Handlers for one event type, keyed by type string
    typed: Arc<Mutex<AHashMap<&'static str, Vec<Subscription>>>>,
    /// Handlers for every event
    all: Arc<Mutex<Vec<Subscription>>>,
    next_id: AtomicU64,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            typed: Arc::new(Mutex::new(AHashMap::new())),
            all: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Subscribe to every event
    pub fn subscribe(&self, handler: Box<dyn EventHandler>) -> SubscriptionId {
        let id = self.next_id();
        self.all.lock().push(Subscription::new(id, handler));
        id
    }

    /// Subscribe to events of one type, e.g. `DASH/EVT.COMMAND.FAILED`
    pub fn subscribe_to(&self, event_type: &'static str, handler: Box<dyn EventHandler>) -> SubscriptionId {
        let id = self.next_id();
        self.typed
            .lock()
            .entry(event_type)
            .or_default()
            .push(Subscription::new(id, handler));
        id
    }

    /// Forward every event into a channel, for async consumers
    pub fn channel(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<DashboardEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.subscribe(handler_from_fn(move |event| {
            // A dropped receiver only means nobody listens anymore
            let _ = sender.send(event.clone());
        }));
        (id, receiver)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut removed = false;
        self.all.lock().retain(|s| {
            let keep = s.id != id;
            removed |= !keep;
            keep
        });
        for subscriptions in self.typed.lock().values_mut() {
            subscriptions.retain(|s| {
                let keep = s.id != id;
                removed |= !keep;
                keep
            });
        }
        removed
    }

    /// Publish an event
    ///
    /// Handlers run against the subscriptions present when publishing starts; the subscription
    /// lists are not locked while they run.
    pub fn publish(&self, event: &DashboardEvent) {
        tracing::debug!("Publishing {} ({:?})", event.event_type(), event.correlation_id);

        let mut handlers: Vec<SharedHandler> = self.all.lock().iter().map(|s| s.handler.clone()).collect();
        if let Some(subscriptions) = self.typed.lock().get(event.event_type()) {
            handlers.extend(subscriptions.iter().map(|s| s.handler.clone()));
        }

        for handler in handlers {
            handler.lock().handle(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.all.lock().len() + self.typed.lock().values().map(Vec::len).sum::<usize>()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&DashboardEvent) + Send + Sync,
{
    fn handle(&mut self, event: &DashboardEvent) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&DashboardEvent) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventPayload;

    fn renamed(title: &str) -> DashboardEvent {
        DashboardEvent::new(
            None,
            EventPayload::DashboardRenamed {
                title: title.to_string(),
            },
        )
    }

    #[test]
    fn test_event_bus_delivers_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        bus.subscribe(handler_from_fn(move |event| {
            if let EventPayload::DashboardRenamed { title } = &event.payload {
                sink.lock().push(title.clone());
            }
        }));

        bus.publish(&renamed("a"));
        bus.publish(&renamed("b"));

        assert_eq!(*seen.lock(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_typed_subscription_and_unsubscribe() {
        let bus = EventBus::new();
        let count = Arc::new(Mutex::new(0));
        let counter = count.clone();
        let id = bus.subscribe_to(
            "DASH/EVT.COMMAND.FAILED",
            handler_from_fn(move |_| *counter.lock() += 1),
        );

        bus.publish(&renamed("ignored"));
        assert_eq!(*count.lock(), 0);

        assert!(bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let bus = Arc::new(EventBus::new());
        let own_id = Arc::new(Mutex::new(None));
        let calls = Arc::new(Mutex::new(0));

        let (weak_bus, id_slot, counter) = (Arc::downgrade(&bus), own_id.clone(), calls.clone());
        let id = bus.subscribe(handler_from_fn(move |_| {
            *counter.lock() += 1;
            if let (Some(bus), Some(id)) = (weak_bus.upgrade(), *id_slot.lock()) {
                bus.unsubscribe(id);
                bus.subscribe(handler_from_fn(|_| {}));
            }
        }));
        *own_id.lock() = Some(id);

        bus.publish(&renamed("first"));
        bus.publish(&renamed("second"));

        assert_eq!(*calls.lock(), 1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_channel_forwarding() {
        let bus = EventBus::new();
        let (_, mut receiver) = bus.channel();

        bus.publish(&renamed("x"));
        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_type(), "DASH/EVT.RENAMED");
    }
}
