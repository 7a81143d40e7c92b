//! Shared fixtures for the integration suite.

use escrow_bus::InMemoryEventBus;
use escrow_core::adapters::memory::{
    InMemoryEscrowRepository, InMemoryMilestoneRepository, InMemoryProjectRepository,
};
use escrow_core::ports::inbound::{EscrowApi, NewMilestone, NewProject};
use escrow_core::ports::outbound::{ManualTimeSource, RandomCodeGenerator};
use escrow_core::{EscrowConfig, EscrowService};
use escrow_types::{Amount, ProjectId, Role, Timestamp, UserId};
use std::sync::Arc;

/// Clock origin for every test.
pub const START: Timestamp = 1_000_000;

/// Default invite TTL (48 hours in ms), matching the engine default.
pub const TTL: u64 = 48 * 60 * 60 * 1000;

/// The fully in-memory service with a manual clock.
pub type TestService = EscrowService<
    InMemoryProjectRepository,
    InMemoryMilestoneRepository,
    InMemoryEscrowRepository,
    ManualTimeSource,
    RandomCodeGenerator,
    InMemoryEventBus,
>;

/// Everything a test needs to drive the engine and observe its events.
pub struct Harness {
    pub service: Arc<TestService>,
    pub clock: Arc<ManualTimeSource>,
    pub bus: Arc<InMemoryEventBus>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(ManualTimeSource::new(START));
        let bus = Arc::new(InMemoryEventBus::new());
        let service = Arc::new(EscrowService::new(
            EscrowConfig::default(),
            Arc::new(InMemoryProjectRepository::new()),
            Arc::new(InMemoryMilestoneRepository::new()),
            Arc::new(InMemoryEscrowRepository::new()),
            clock.clone(),
            Arc::new(RandomCodeGenerator),
            bus.clone(),
        ));
        Self {
            service,
            clock,
            bus,
        }
    }

    /// Create a buyer-owned project with one milestone per amount, join it
    /// as the freelancer, and fund it. Returns the project id.
    pub async fn active_project(&self, amounts: &[Amount]) -> ProjectId {
        let project = self
            .service
            .create_project(buyer(), project_with_milestones(amounts))
            .await
            .expect("create");
        self.service
            .join_project(project.code.as_str(), freelancer(), Role::Freelancer)
            .await
            .expect("join");
        self.service
            .fund_project(project.id, buyer())
            .await
            .expect("fund");
        project.id
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn buyer() -> UserId {
    UserId::from("buyer-1")
}

pub fn freelancer() -> UserId {
    UserId::from("worker-1")
}

/// A buyer-created project input with one milestone per amount.
pub fn project_with_milestones(amounts: &[Amount]) -> NewProject {
    NewProject {
        title: "Site redesign".into(),
        description: "full redesign of the marketing site".into(),
        creator_role: Role::Buyer,
        document_url: None,
        milestones: amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| NewMilestone {
                title: format!("milestone-{i}"),
                description: "deliverable".into(),
                amount,
                deadline: START + TTL * 4,
            })
            .collect(),
    }
}

/// Install a test subscriber so `RUST_LOG`-gated tracing output is visible
/// when a test is run with `--nocapture`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
