//! Error types for the escrow engine.

use escrow_types::{Amount, MilestoneStatus, ProjectStatus};
use thiserror::Error;

/// Escrow engine errors.
///
/// Every variant is reported synchronously to the caller; the engine never
/// retries on its own. `InsufficientEscrow` should be unreachable while the
/// milestone-amount invariants hold, but the guard is mandatory and a
/// violation is a hard stop, never a clamp.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EscrowError {
    /// Malformed input; the caller can correct and retry.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// No project with the given id or join code.
    #[error("project not found")]
    ProjectNotFound,

    /// No milestone with the given id.
    #[error("milestone not found")]
    MilestoneNotFound,

    /// The project has no escrow ledger (counterparty has not joined).
    #[error("escrow ledger not found for project")]
    EscrowNotFound,

    /// A ledger already exists for this project.
    #[error("escrow ledger already exists for project")]
    EscrowAlreadyExists,

    /// The caller lacks the role or identity this transition requires.
    #[error("forbidden: {action}")]
    Forbidden { action: &'static str },

    /// The creator tried to redeem their own join code.
    #[error("cannot join your own project")]
    CannotJoinOwnProject,

    /// The invite window closed before the counterparty joined.
    #[error("join code expired")]
    InviteExpired,

    /// Both role slots are already filled.
    #[error("project already has both parties")]
    AlreadyJoined,

    /// The ledger is already funded (funding is not idempotent).
    #[error("escrow already funded")]
    AlreadyFunded,

    /// A release was attempted before the ledger was funded.
    #[error("escrow not funded")]
    NotFunded,

    /// A project transition was attempted from a state that forbids it.
    #[error("project cannot {action} while {status}")]
    InvalidProjectState {
        action: &'static str,
        status: ProjectStatus,
    },

    /// A milestone transition was attempted from a state that forbids it.
    #[error("milestone cannot {action} while {status}")]
    InvalidMilestoneState {
        action: &'static str,
        status: MilestoneStatus,
    },

    /// A release would exceed the funds still held in escrow.
    #[error("insufficient escrow: requested {requested}, remaining {remaining}")]
    InsufficientEscrow {
        requested: Amount,
        remaining: Amount,
    },

    /// Could not allocate a unique join code within the retry budget.
    #[error("could not allocate a unique join code after {attempts} attempts")]
    CodeCollision { attempts: u32 },

    /// Storage-layer failure.
    #[error("storage error: {reason}")]
    Storage { reason: String },
}

impl EscrowError {
    /// Shorthand for a validation failure.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

/// Result type for escrow operations.
pub type EscrowResult<T> = Result<T, EscrowError>;
