//! # Escrow Bus - Lifecycle Event Dispatch
//!
//! In-process event bus connecting the escrow engine to notification
//! consumers. Every committed state transition (join, fund, submit,
//! approve, ...) is published here; consumers such as the notification
//! relay subscribe with a topic filter.
//!
//! ## Delivery Contract
//!
//! - Publishing never fails and never blocks a state transition: an event
//!   with no live subscribers is dropped with a warning.
//! - Delivery is at-most-once, best-effort. A lagging subscriber loses the
//!   oldest buffered events, not the newest.
//! - Events are facts about transitions that already happened; consumers
//!   must never feed back into the transition that produced them.
//!
//! ```text
//! ┌──────────────┐                    ┌───────────────────┐
//! │ Escrow Engine│                    │ Notification Relay│
//! │              │    publish()       │                   │
//! │              │ ──────┐            │                   │
//! └──────────────┘       │            └───────────────────┘
//!                        ▼                     ↑
//!                  ┌──────────────┐            │
//!                  │  Event Bus   │ ───────────┘
//!                  └──────────────┘  subscribe()
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{EscrowEvent, EventFilter, EventTopic};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;
