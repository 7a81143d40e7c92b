//! Domain entities and their transition guards.
//!
//! Entities keep their state-machine fields private; the only way to move
//! a project, milestone, or ledger between states is through the guarded
//! methods here, each of which validates against the status transition
//! tables in `escrow-types` before mutating anything.

pub mod ledger;
pub mod milestone;
pub mod project;

pub use ledger::{milestone_total, EscrowAccount};
pub use milestone::Milestone;
pub use project::Project;
