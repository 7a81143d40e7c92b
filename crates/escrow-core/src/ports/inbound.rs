//! Inbound (Driving) port for the escrow engine.
//!
//! One method per externally triggered operation. The caller supplies the
//! acting user's identity explicitly; authentication itself happens in the
//! out-of-scope transport layer.

use crate::domain::{EscrowAccount, Milestone, Project};
use crate::error::EscrowResult;
use async_trait::async_trait;
use escrow_types::{Amount, MilestoneId, ProjectId, ProjectStatus, Role, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Input for creating a project, including its initial milestone batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    /// Which slot the creator occupies.
    pub creator_role: Role,
    /// Optional master-document reference.
    pub document_url: Option<String>,
    /// Milestones to create with the project. More can be added until the
    /// counterparty joins.
    pub milestones: Vec<NewMilestone>,
}

/// Input for a single milestone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMilestone {
    pub title: String,
    pub description: String,
    /// Amount in minor currency units; must be positive.
    pub amount: Amount,
    /// Deadline; must be in the future.
    pub deadline: Timestamp,
}

/// Everything a participant sees about one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectOverview {
    pub project: Project,
    pub milestones: Vec<Milestone>,
    /// Absent until the counterparty joins.
    pub escrow: Option<EscrowAccount>,
}

/// What a prospective joiner sees before redeeming a code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPreview {
    pub project: Project,
    pub milestones: Vec<Milestone>,
}

/// Result of approving a milestone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    pub milestone: Milestone,
    /// Ledger state after the release.
    pub escrow: EscrowAccount,
    /// `Completed` when this approval was the last one, else `Active`.
    pub project_status: ProjectStatus,
}

/// The operations the escrow engine exposes to its callers.
#[async_trait]
pub trait EscrowApi: Send + Sync {
    /// Create a project in `AwaitingCounterparty` with a fresh join code
    /// and its initial milestones.
    async fn create_project(&self, creator: UserId, input: NewProject) -> EscrowResult<Project>;

    /// Add a milestone to a project that is still awaiting its
    /// counterparty. Creator only.
    async fn add_milestone(
        &self,
        project_id: ProjectId,
        caller: UserId,
        input: NewMilestone,
    ) -> EscrowResult<Milestone>;

    /// Redeem a join code, filling the empty role slot and opening the
    /// escrow ledger with the milestone sum at this instant.
    ///
    /// Expiry is checked lazily here: an expired invite cancels the
    /// project before the error is reported.
    async fn join_project(&self, code: &str, joiner: UserId, role: Role) -> EscrowResult<Project>;

    /// Fund the escrow in full. Buyer only; project must be awaiting
    /// funding.
    async fn fund_project(
        &self,
        project_id: ProjectId,
        caller: UserId,
    ) -> EscrowResult<EscrowAccount>;

    /// Submit work for a milestone. Freelancer only; the project moves
    /// under review.
    async fn submit_milestone(
        &self,
        milestone_id: MilestoneId,
        caller: UserId,
        submission_url: String,
    ) -> EscrowResult<Milestone>;

    /// Approve submitted work, releasing the milestone amount from escrow
    /// in the same atomic unit. Buyer only.
    async fn approve_milestone(
        &self,
        milestone_id: MilestoneId,
        caller: UserId,
    ) -> EscrowResult<ApprovalOutcome>;

    /// Send submitted work back for changes. Buyer only.
    async fn request_revision(
        &self,
        milestone_id: MilestoneId,
        caller: UserId,
    ) -> EscrowResult<Milestone>;

    /// Freeze a non-terminal project in `Disputed`. Any participant.
    async fn raise_dispute(
        &self,
        project_id: ProjectId,
        caller: UserId,
        reason: String,
    ) -> EscrowResult<Project>;

    /// Cancel every project whose invite expired without a counterparty.
    /// Intended for an external scheduler; returns the number cancelled.
    async fn sweep_expired_invites(&self) -> EscrowResult<usize>;

    /// Full view of one project. Participants only.
    async fn project_overview(
        &self,
        project_id: ProjectId,
        caller: UserId,
    ) -> EscrowResult<ProjectOverview>;

    /// Pre-join preview by code: the project and its milestones.
    async fn project_by_code(&self, code: &str) -> EscrowResult<ProjectPreview>;

    /// Every project the user created or participates in.
    async fn projects_for_user(&self, user: &UserId) -> EscrowResult<Vec<Project>>;
}
