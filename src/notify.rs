//! Process-wide change notification.
//!
//! One [`ChangeNotifier`] is created per process and shared (via `Arc`)
//! with every component that publishes or listens. Delivery is synchronous:
//! `publish` runs every handler subscribed to the topic, in subscription
//! order, before it returns. A handler that panics is logged and skipped;
//! the remaining handlers still run. Events are not retained for late
//! subscribers, and consumers must `unsubscribe` once they stop caring.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error};

use crate::record::SightingId;

/// Topic announced after a submission has been persisted.
pub const NEW_SIGHTING: &str = "newSighting";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic: String,
    /// Id of the affected record. Listeners must cope with it being absent.
    pub sighting_id: Option<SightingId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Handler = Arc<dyn Fn(&Notification) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    topic: String,
    handler: Handler,
}

#[derive(Default)]
pub struct ChangeNotifier {
    next_id: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, topic: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&Notification) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Subscription {
            id,
            topic: topic.to_string(),
            handler: Arc::new(handler),
        });
        debug!("Subscribed {:?} to {}", id, topic);
        id
    }

    /// Returns `false` when the subscription was already released.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.lock();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        let removed = subscriptions.len() != before;
        if removed {
            debug!("Released subscription {:?}", id);
        }
        removed
    }

    /// Delivers to every current subscriber of `topic` and returns how many
    /// handlers completed.
    pub fn publish(&self, topic: &str, sighting_id: Option<SightingId>) -> usize {
        // Handlers run without the lock held so they may (un)subscribe.
        let handlers: Vec<Handler> = self
            .lock()
            .iter()
            .filter(|s| s.topic == topic)
            .map(|s| Arc::clone(&s.handler))
            .collect();

        let notification = Notification {
            topic: topic.to_string(),
            sighting_id,
        };
        let mut delivered = 0;
        for handler in &handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(&notification))) {
                Ok(()) => delivered += 1,
                Err(_) => error!(
                    "Subscriber to {} panicked while handling {:?}",
                    topic, sighting_id
                ),
            }
        }
        debug!(
            "Published {} to {}/{} subscriber(s)",
            topic,
            delivered,
            handlers.len()
        );
        delivered
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.lock().iter().filter(|s| s.topic == topic).count()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_runs_handlers_in_subscription_order() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            notifier.subscribe(NEW_SIGHTING, move |n| {
                seen.lock().unwrap().push((label, n.sighting_id));
            });
        }

        assert_eq!(notifier.publish(NEW_SIGHTING, Some(4)), 3);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", Some(4)), ("second", Some(4)), ("third", Some(4))]
        );
    }

    #[test]
    fn test_panicking_handler_does_not_stop_delivery() {
        let notifier = ChangeNotifier::new();
        let hits = Arc::new(AtomicU64::new(0));

        let before = Arc::clone(&hits);
        notifier.subscribe(NEW_SIGHTING, move |_| {
            before.fetch_add(1, Ordering::SeqCst);
        });
        notifier.subscribe(NEW_SIGHTING, |_| panic!("view gone"));
        let after = Arc::clone(&hits);
        notifier.subscribe(NEW_SIGHTING, move |_| {
            after.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(notifier.publish(NEW_SIGHTING, Some(1)), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(notifier.subscriber_count(NEW_SIGHTING), 3);
    }

    #[test]
    fn test_topics_are_isolated() {
        let notifier = ChangeNotifier::new();
        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);
        notifier.subscribe("other", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(notifier.publish(NEW_SIGHTING, None), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let notifier = ChangeNotifier::new();
        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);
        let id = notifier.subscribe(NEW_SIGHTING, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.publish(NEW_SIGHTING, Some(1));
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.publish(NEW_SIGHTING, Some(2));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.subscriber_count(NEW_SIGHTING), 0);
    }

    #[test]
    fn test_late_subscriber_misses_earlier_events() {
        let notifier = ChangeNotifier::new();
        notifier.publish(NEW_SIGHTING, Some(1));

        let hits = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&hits);
        notifier.subscribe(NEW_SIGHTING, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let notifier = Arc::new(ChangeNotifier::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let inner = Arc::clone(&notifier);
        let own = Arc::clone(&slot);
        let id = notifier.subscribe(NEW_SIGHTING, move |_| {
            if let Some(id) = *own.lock().unwrap() {
                inner.unsubscribe(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        assert_eq!(notifier.publish(NEW_SIGHTING, None), 1);
        assert_eq!(notifier.publish(NEW_SIGHTING, None), 0);
    }
}
