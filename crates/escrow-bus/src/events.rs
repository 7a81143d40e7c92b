//! Escrow lifecycle events.
//!
//! One variant per notification-worthy transition. Each carries the ids
//! and amounts a consumer needs to address and word a notification without
//! another lookup.

use escrow_types::{Amount, JoinCode, MilestoneId, ProjectId, Role, UserId};
use serde::{Deserialize, Serialize};

/// All events the engine publishes to the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EscrowEvent {
    /// A project was created and its join code allocated.
    ProjectCreated {
        project_id: ProjectId,
        title: String,
        code: JoinCode,
        created_by: UserId,
    },

    /// The second party redeemed the join code; escrow ledger opened.
    CounterpartyJoined {
        project_id: ProjectId,
        joiner: UserId,
        role: Role,
        /// Milestone sum locked in as the ledger total at this instant.
        total_amount: Amount,
    },

    /// A join was attempted after the invite window closed; the project
    /// was cancelled.
    InviteExpired { project_id: ProjectId },

    /// The buyer funded the escrow in full.
    EscrowFunded {
        project_id: ProjectId,
        total_amount: Amount,
    },

    /// The freelancer submitted work for a milestone.
    WorkSubmitted {
        project_id: ProjectId,
        milestone_id: MilestoneId,
        milestone_title: String,
    },

    /// The buyer sent a milestone back for revision.
    RevisionRequested {
        project_id: ProjectId,
        milestone_id: MilestoneId,
        milestone_title: String,
    },

    /// The buyer approved a milestone and its amount left escrow.
    PaymentReleased {
        project_id: ProjectId,
        milestone_id: MilestoneId,
        amount: Amount,
    },

    /// Every milestone is approved; the project is complete.
    ProjectCompleted { project_id: ProjectId },

    /// A participant raised a dispute; the project is frozen.
    DisputeRaised {
        project_id: ProjectId,
        raised_by: UserId,
        reason: String,
    },
}

impl EscrowEvent {
    /// The topic used for subscription filtering.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ProjectCreated { .. }
            | Self::CounterpartyJoined { .. }
            | Self::InviteExpired { .. }
            | Self::ProjectCompleted { .. } => EventTopic::Project,
            Self::EscrowFunded { .. } | Self::PaymentReleased { .. } => EventTopic::Escrow,
            Self::WorkSubmitted { .. } | Self::RevisionRequested { .. } => EventTopic::Milestone,
            Self::DisputeRaised { .. } => EventTopic::Dispute,
        }
    }

    /// The project this event belongs to.
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        match self {
            Self::ProjectCreated { project_id, .. }
            | Self::CounterpartyJoined { project_id, .. }
            | Self::InviteExpired { project_id }
            | Self::EscrowFunded { project_id, .. }
            | Self::WorkSubmitted { project_id, .. }
            | Self::RevisionRequested { project_id, .. }
            | Self::PaymentReleased { project_id, .. }
            | Self::ProjectCompleted { project_id }
            | Self::DisputeRaised { project_id, .. } => *project_id,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Project lifecycle (created, joined, expired, completed).
    Project,
    /// Money movement (funded, released).
    Escrow,
    /// Milestone review cycle (submitted, revision requested).
    Milestone,
    /// Dispute flags.
    Dispute,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
}

impl EventFilter {
    /// A filter that accepts every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self { topics }
    }

    /// Whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &EscrowEvent) -> bool {
        self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic())
    }
}
