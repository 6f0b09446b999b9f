//! Subscriber registry and fan-out.

use std::collections::HashMap;
use std::fmt;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

use crate::error::NotificationError;
use crate::types::ChangeEvent;

/// Default per-subscriber queue length.
/// Events beyond this limit are dropped for that subscriber only.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Identifies one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The receiving side of one subscriber.
///
/// Whoever holds it consumes events; dropping it disconnects the subscriber
/// and the notifier prunes it on the next publish.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event. Returns `None` once the notifier dropped
    /// this subscriber (unsubscribe or shutdown).
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }

    /// Returns a queued event without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }
}

/// Fans change events out to every registered subscriber.
///
/// Created once at process start and shared through an `Arc`. The subscriber
/// map sits behind a lock because handlers run on a multi-threaded runtime.
///
/// # Example
///
/// ```
/// use carebase_core::NewRecord;
/// use carebase_notifications::{ChangeEvent, ChangeNotifier};
///
/// let notifier = ChangeNotifier::new();
/// let mut subscription = notifier.subscribe();
///
/// let record = NewRecord::new("Ada").into_record(1);
/// assert_eq!(notifier.publish(&ChangeEvent::created(record)), 1);
/// assert!(subscription.try_recv().is_some());
/// ```
pub struct ChangeNotifier {
    subscribers: RwLock<HashMap<SubscriptionId, mpsc::Sender<ChangeEvent>>>,
    capacity: usize,
}

impl ChangeNotifier {
    /// Create a notifier with the default per-subscriber queue length.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a notifier with a custom per-subscriber queue length.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Register a new subscriber. Events published before this call are not
    /// delivered to it.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.capacity);
        let id = SubscriptionId::new();
        self.subscribers.write().insert(id, sender);

        tracing::debug!(subscription.id = %id, "Subscriber registered");

        Subscription { id, receiver }
    }

    /// Remove a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            tracing::debug!(subscription.id = %id, "Subscriber removed");
        }
        removed
    }

    /// Deliver an event to every current subscriber without waiting.
    ///
    /// Returns the number of subscribers that accepted the event. Subscribers
    /// whose receiver is gone are pruned; full queues lose this event.
    pub fn publish(&self, event: &ChangeEvent) -> usize {
        let mut delivered = 0;
        let mut gone = Vec::new();

        {
            let subscribers = self.subscribers.read();
            for (id, sender) in subscribers.iter() {
                match deliver(*id, sender, event) {
                    Ok(()) => delivered += 1,
                    Err(NotificationError::SubscriberGone(id)) => {
                        tracing::debug!(subscription.id = %id, "Dropping event for disconnected subscriber");
                        gone.push(id);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Event delivery failed");
                    }
                }
            }
        }

        if !gone.is_empty() {
            let mut subscribers = self.subscribers.write();
            for id in &gone {
                subscribers.remove(id);
            }
        }

        tracing::debug!(
            event = event.event_name(),
            record.id = event.record.id,
            subscribers = delivered,
            "Published change event"
        );

        delivered
    }

    /// Get the number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Check if there are any registered subscribers.
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }

    /// Drop every subscriber. Their `recv` calls return `None`, which ends the
    /// consuming tasks. Used at shutdown.
    pub fn clear(&self) -> usize {
        let mut subscribers = self.subscribers.write();
        let count = subscribers.len();
        subscribers.clear();
        count
    }
}

fn deliver(
    id: SubscriptionId,
    sender: &mpsc::Sender<ChangeEvent>,
    event: &ChangeEvent,
) -> Result<(), NotificationError> {
    sender.try_send(event.clone()).map_err(|err| match err {
        TrySendError::Closed(_) => NotificationError::SubscriberGone(id),
        TrySendError::Full(_) => NotificationError::SubscriberLagging(id),
    })
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscriber_count", &self.subscriber_count())
            .field("capacity", &self.capacity)
            .finish()
    }
}
