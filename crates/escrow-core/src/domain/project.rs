//! Project entity: membership, funding gate, and lifecycle.

use crate::error::{EscrowError, EscrowResult};
use escrow_types::{JoinCode, ProjectId, ProjectStatus, Role, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A two-party agreement coordinating milestones and an escrow ledger.
///
/// The creator occupies exactly one of the buyer/freelancer slots at
/// creation; the other slot is filled once, via
/// [`assign_counterparty`](Self::assign_counterparty). Status moves only
/// through the guarded methods below, each validated against the
/// [`ProjectStatus`] transition table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Human-shareable invite token, unique across live projects.
    pub code: JoinCode,
    pub title: String,
    pub description: String,
    pub created_by: UserId,
    buyer_id: Option<UserId>,
    freelancer_id: Option<UserId>,
    status: ProjectStatus,
    /// Instant after which the join code is no longer redeemable.
    pub invite_expires_at: Timestamp,
    /// Optional master-document reference (contract, brief).
    pub document_url: Option<String>,
    pub created_at: Timestamp,
}

impl Project {
    /// Create a project awaiting its counterparty.
    ///
    /// The creator takes the slot matching `creator_role`; the other slot
    /// stays empty until the join protocol fills it.
    pub fn new(
        code: JoinCode,
        title: impl Into<String>,
        description: impl Into<String>,
        created_by: UserId,
        creator_role: Role,
        document_url: Option<String>,
        now: Timestamp,
        invite_ttl_ms: u64,
    ) -> EscrowResult<Self> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(EscrowError::validation("project title must not be empty"));
        }
        let (buyer_id, freelancer_id) = match creator_role {
            Role::Buyer => (Some(created_by.clone()), None),
            Role::Freelancer => (None, Some(created_by.clone())),
        };
        Ok(Self {
            id: ProjectId::new(),
            code,
            title,
            description: description.into(),
            created_by,
            buyer_id,
            freelancer_id,
            status: ProjectStatus::AwaitingCounterparty,
            invite_expires_at: now.saturating_add(invite_ttl_ms),
            document_url,
            created_at: now,
        })
    }

    // ─────────────────────────────────────────────────────────
    // Membership
    // ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn buyer_id(&self) -> Option<&UserId> {
        self.buyer_id.as_ref()
    }

    #[must_use]
    pub fn freelancer_id(&self) -> Option<&UserId> {
        self.freelancer_id.as_ref()
    }

    /// Whether `user` created the project or occupies either slot.
    #[must_use]
    pub fn is_participant(&self, user: &UserId) -> bool {
        self.created_by == *user
            || self.buyer_id.as_ref() == Some(user)
            || self.freelancer_id.as_ref() == Some(user)
    }

    /// The role `user` holds, if any.
    #[must_use]
    pub fn role_of(&self, user: &UserId) -> Option<Role> {
        if self.buyer_id.as_ref() == Some(user) {
            Some(Role::Buyer)
        } else if self.freelancer_id.as_ref() == Some(user) {
            Some(Role::Freelancer)
        } else {
            None
        }
    }

    #[must_use]
    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Whether the invite window has closed.
    #[must_use]
    pub fn invite_expired(&self, now: Timestamp) -> bool {
        now >= self.invite_expires_at
    }

    // ─────────────────────────────────────────────────────────
    // Guarded transitions
    // ─────────────────────────────────────────────────────────

    /// Fill the empty role slot and move to `AwaitingFunding`.
    ///
    /// The caller has already checked invite expiry (and cancelled the
    /// project if so); this guard covers self-join, the slot race, and a
    /// role that is already taken.
    pub fn assign_counterparty(&mut self, joiner: UserId, role: Role) -> EscrowResult<()> {
        if self.status != ProjectStatus::AwaitingCounterparty {
            return Err(EscrowError::AlreadyJoined);
        }
        if joiner == self.created_by {
            return Err(EscrowError::CannotJoinOwnProject);
        }
        let slot = match role {
            Role::Buyer => &mut self.buyer_id,
            Role::Freelancer => &mut self.freelancer_id,
        };
        if slot.is_some() {
            return Err(EscrowError::validation(format!(
                "project already has a {role}"
            )));
        }
        *slot = Some(joiner);
        self.transition(ProjectStatus::AwaitingFunding, "join")
    }

    /// Funding confirmed: the project becomes active.
    pub fn mark_funded(&mut self) -> EscrowResult<()> {
        self.transition(ProjectStatus::Active, "fund")
    }

    /// A milestone was submitted: active work moves under review.
    pub fn begin_review(&mut self) -> EscrowResult<()> {
        self.transition(ProjectStatus::UnderReview, "submit work on")
    }

    /// A review verdict left unapproved milestones: back to active.
    pub fn resume_active(&mut self) -> EscrowResult<()> {
        self.transition(ProjectStatus::Active, "resume")
    }

    /// Every milestone approved: the project is complete.
    pub fn complete(&mut self) -> EscrowResult<()> {
        self.transition(ProjectStatus::Completed, "complete")
    }

    /// The invite expired before anyone joined.
    pub fn cancel_expired(&mut self) -> EscrowResult<()> {
        self.transition(ProjectStatus::Cancelled, "cancel")
    }

    /// A participant raised a dispute. Terminal.
    pub fn dispute(&mut self) -> EscrowResult<()> {
        self.transition(ProjectStatus::Disputed, "dispute")
    }

    fn transition(&mut self, next: ProjectStatus, action: &'static str) -> EscrowResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(EscrowError::InvalidProjectState {
                action,
                status: self.status,
            });
        }
        self.status = next;
        Ok(())
    }
}
