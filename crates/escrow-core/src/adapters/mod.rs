//! Adapters: concrete implementations of the outbound ports.

pub mod memory;
pub mod notify;

pub use memory::{InMemoryEscrowRepository, InMemoryMilestoneRepository, InMemoryProjectRepository};
pub use notify::{LogNotifier, NotificationRelay, RecordingNotifier};
