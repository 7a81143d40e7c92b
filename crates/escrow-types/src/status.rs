//! Project and milestone status machines.
//!
//! Both lifecycles are closed enums with an exhaustive transition table.
//! The table is the single authority on which moves are legal; the engine
//! consults it inside every guarded mutation, so a handler can never push
//! an entity into a state the table does not allow.
//!
//! ```text
//! Project:
//!   AwaitingCounterparty ──join──→ AwaitingFunding ──fund──→ Active
//!             │                                                │  ↑
//!          expiry                                           submit │ approve/
//!             ↓                                                ↓  │ revision
//!         Cancelled                                        UnderReview
//!                                                              │
//!                                        all milestones approved ↓
//!   (any non-terminal) ──dispute──→ Disputed          Completed
//!
//! Milestone:
//!   Pending ──submit──→ Submitted ──approve──→ Approved
//!                           │  ↑
//!                   revision ↓  │ resubmit
//!                     RevisionRequested
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall lifecycle state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    /// Created; waiting for the second party to redeem the join code.
    AwaitingCounterparty,
    /// Both parties present; waiting for the buyer to fund the escrow.
    AwaitingFunding,
    /// Funded; work in progress.
    Active,
    /// A milestone has been submitted and awaits the buyer's verdict.
    UnderReview,
    /// Every milestone approved and paid out. Terminal.
    Completed,
    /// Invite expired before a counterparty joined. Terminal.
    Cancelled,
    /// A party raised a dispute. Terminal for this engine.
    Disputed,
}

impl ProjectStatus {
    /// Whether no further transitions are permitted from this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Disputed)
    }

    /// Whether the transition `self → next` is legal.
    ///
    /// Disputes are reachable from every non-terminal state; everything
    /// else follows the funding/review cycle.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        if next == Self::Disputed {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Self::AwaitingCounterparty, Self::AwaitingFunding)
                | (Self::AwaitingCounterparty, Self::Cancelled)
                | (Self::AwaitingFunding, Self::Active)
                | (Self::Active, Self::UnderReview)
                | (Self::Active, Self::Completed)
                | (Self::UnderReview, Self::Active)
                | (Self::UnderReview, Self::Completed)
        )
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AwaitingCounterparty => "AWAITING_COUNTERPARTY",
            Self::AwaitingFunding => "AWAITING_FUNDING",
            Self::Active => "ACTIVE",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Disputed => "DISPUTED",
        };
        f.write_str(s)
    }
}

/// Lifecycle state of a single milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    /// Created; no work submitted yet.
    Pending,
    /// Work submitted; awaiting the buyer's verdict.
    Submitted,
    /// Approved and released. Terminal.
    Approved,
    /// Buyer asked for changes; freelancer may resubmit.
    RevisionRequested,
}

impl MilestoneStatus {
    /// Whether no further transitions are permitted from this state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Approved)
    }

    /// Whether the transition `self → next` is legal.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Submitted)
                | (Self::Submitted, Self::Approved)
                | (Self::Submitted, Self::RevisionRequested)
                | (Self::RevisionRequested, Self::Submitted)
        )
    }
}

impl fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Submitted => "SUBMITTED",
            Self::Approved => "APPROVED",
            Self::RevisionRequested => "REVISION_REQUESTED",
        };
        f.write_str(s)
    }
}
