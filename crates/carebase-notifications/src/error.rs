use thiserror::Error;

use crate::notifier::SubscriptionId;

/// Failure to hand an event to one subscriber.
///
/// Never surfaced to the publisher's caller; the notifier logs it and moves on.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Subscriber {0} is gone")]
    SubscriberGone(SubscriptionId),

    #[error("Subscriber {0} is lagging, event dropped")]
    SubscriberLagging(SubscriptionId),
}
