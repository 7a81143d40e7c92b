//! Ports: the engine's boundary traits.
//!
//! Inbound ports are what callers (an API layer, a scheduler) invoke;
//! outbound ports are what the engine depends on (storage, clock, code
//! generator, notification sender).

pub mod inbound;
pub mod outbound;

pub use inbound::{
    ApprovalOutcome, EscrowApi, NewMilestone, NewProject, ProjectOverview, ProjectPreview,
};
pub use outbound::{
    CodeGenerator, EscrowRepository, FixedCodeGenerator, ManualTimeSource, MilestoneRepository,
    Notification, NotificationSender, NotifyError, ProjectRepository, RandomCodeGenerator,
    SystemTimeSource, TimeSource,
};
