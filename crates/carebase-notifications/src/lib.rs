//! Realtime change notification for the Carebase server.
//!
//! # Architecture
//!
//! ```text
//!   ResourceService ──publish──▶ ChangeNotifier
//!                                   │ try_send (never blocks)
//!                ┌──────────────────┼──────────────────┐
//!                ▼                  ▼                  ▼
//!          mpsc queue A       mpsc queue B       mpsc queue C
//!                │                  │                  │
//!         websocket task A   websocket task B   websocket task C
//! ```
//!
//! Each subscriber owns its receiving end. Publishing is fire-and-forget:
//! a subscriber that is gone or too slow loses the event, the publisher
//! never sees an error.

pub mod error;
pub mod notifier;
pub mod types;

pub use error::NotificationError;
pub use notifier::{ChangeNotifier, DEFAULT_CHANNEL_CAPACITY, Subscription, SubscriptionId};
pub use types::{ChangeEvent, ChangeKind};
