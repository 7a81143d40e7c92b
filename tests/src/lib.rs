//! # Escrow Engine Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── flows.rs          # End-to-end lifecycle scenarios
//!     ├── concurrency.rs    # Races on joins, approvals, funding
//!     ├── conservation.rs   # Randomized ledger invariant runs
//!     └── notifications.rs  # Event dispatch and relay behavior
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p escrow-tests
//!
//! # By category
//! cargo test -p escrow-tests integration::flows
//! cargo test -p escrow-tests integration::concurrency
//! ```

#![allow(dead_code)]

pub mod integration;
