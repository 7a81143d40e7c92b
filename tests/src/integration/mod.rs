//! Cross-crate integration tests: engine + bus + adapters together.

pub mod support;

mod concurrency;
mod conservation;
mod notifications;
