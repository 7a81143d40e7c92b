//! Milestone entity and its review cycle.

use crate::error::{EscrowError, EscrowResult};
use escrow_types::{Amount, MilestoneId, MilestoneStatus, ProjectId, Timestamp};
use serde::{Deserialize, Serialize};

/// A discrete, separately-payable unit of deliverable work.
///
/// The amount is fixed at creation; there is no partial re-negotiation.
/// Status moves only through [`submit`](Self::submit),
/// [`approve`](Self::approve), and
/// [`request_revision`](Self::request_revision).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    amount: Amount,
    pub deadline: Timestamp,
    status: MilestoneStatus,
    submission_url: Option<String>,
    pub created_at: Timestamp,
}

impl Milestone {
    /// Create a pending milestone, validating the payable terms.
    pub fn new(
        project_id: ProjectId,
        title: impl Into<String>,
        description: impl Into<String>,
        amount: Amount,
        deadline: Timestamp,
        now: Timestamp,
    ) -> EscrowResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(EscrowError::validation("milestone title must not be empty"));
        }
        if amount == 0 {
            return Err(EscrowError::validation("milestone amount must be positive"));
        }
        if deadline <= now {
            return Err(EscrowError::validation(
                "milestone deadline must be in the future",
            ));
        }
        Ok(Self {
            id: MilestoneId::new(),
            project_id,
            title,
            description: description.into(),
            amount,
            deadline,
            status: MilestoneStatus::Pending,
            submission_url: None,
            created_at: now,
        })
    }

    /// Record a work submission and move to `Submitted`.
    ///
    /// Legal from `Pending` (first submission) and `RevisionRequested`
    /// (resubmission); the new reference replaces the old one.
    pub fn submit(&mut self, submission_url: impl Into<String>) -> EscrowResult<()> {
        self.transition(MilestoneStatus::Submitted, "submit")?;
        self.submission_url = Some(submission_url.into());
        Ok(())
    }

    /// Approve the submitted work. Terminal; the caller releases the
    /// milestone amount from escrow in the same locked unit.
    pub fn approve(&mut self) -> EscrowResult<()> {
        self.transition(MilestoneStatus::Approved, "approve")
    }

    /// Send the submitted work back for changes.
    pub fn request_revision(&mut self) -> EscrowResult<()> {
        self.transition(MilestoneStatus::RevisionRequested, "request revision for")
    }

    fn transition(&mut self, next: MilestoneStatus, action: &'static str) -> EscrowResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(EscrowError::InvalidMilestoneState {
                action,
                status: self.status,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Amount payable on approval, in minor currency units.
    #[must_use]
    pub fn amount(&self) -> Amount {
        self.amount
    }

    #[must_use]
    pub fn status(&self) -> MilestoneStatus {
        self.status
    }

    /// Reference to the submitted work, if any.
    #[must_use]
    pub fn submission_url(&self) -> Option<&str> {
        self.submission_url.as_deref()
    }
}
