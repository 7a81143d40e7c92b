//! # escrow-core
//!
//! Milestone escrow engine for a two-party (buyer / freelancer) agreement.
//!
//! ## Role in System
//!
//! - **State machines**: project and milestone lifecycles as guarded
//!   transitions over closed status enums.
//! - **Ledger**: per-project escrow accounting with a conservation
//!   invariant (`released + remaining == total`) enforced on every
//!   mutation.
//! - **Join protocol**: code-based matchmaking with lazy invite expiry.
//! - **Notification hooks**: committed transitions publish events to
//!   `escrow-bus`; delivery is best-effort and never rolls back a
//!   transition.
//!
//! ## Layout
//!
//! - [`domain`]: entities and their transition guards.
//! - [`ports`]: inbound service API and outbound dependencies
//!   (repositories, time source, code generator, notification sender).
//! - [`adapters`]: in-memory repositories and the notification relay.
//! - [`service`]: the orchestrating [`service::EscrowService`].
//!
//! Every multi-step transition (status check, mutation, dependent ledger
//! mutation) runs under a per-project lock, so racing callers observe
//! either the state before a transition or the state after it, never a
//! half-applied one.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use config::EscrowConfig;
pub use error::{EscrowError, EscrowResult};
pub use service::{EscrowService, InMemoryEscrowService};
