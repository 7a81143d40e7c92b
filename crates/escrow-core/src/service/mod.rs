//! The escrow engine service.
//!
//! [`EscrowService`] implements the inbound [`EscrowApi`] port on top of
//! the outbound ports: repositories for storage, a time source for the
//! clock, a code generator for invites, and an event publisher for
//! notification hooks.
//!
//! ## Atomicity
//!
//! Each operation acquires the affected project's lock before its first
//! status read and releases it after its last write. That makes every
//! status-check + mutation + ledger-mutation sequence one atomic unit:
//! a racing double-approve observes `Approved` and fails, a racing second
//! join observes a filled slot and fails, and fund/release on one ledger
//! are serialized.

mod api;
mod locks;


use crate::adapters::memory::{
    InMemoryEscrowRepository, InMemoryMilestoneRepository, InMemoryProjectRepository,
};
use crate::config::EscrowConfig;
use crate::domain::Project;
use crate::error::{EscrowError, EscrowResult};
use crate::ports::outbound::{
    CodeGenerator, EscrowRepository, MilestoneRepository, ProjectRepository, RandomCodeGenerator,
    SystemTimeSource, TimeSource,
};
use escrow_bus::{EventPublisher, InMemoryEventBus};
use escrow_types::{JoinCode, ProjectId};
use locks::ProjectLocks;
use std::sync::Arc;

/// Orchestrates the project, milestone, and ledger state machines.
pub struct EscrowService<P, M, E, T, G, B>
where
    P: ProjectRepository,
    M: MilestoneRepository,
    E: EscrowRepository,
    T: TimeSource,
    G: CodeGenerator,
    B: EventPublisher,
{
    config: EscrowConfig,
    projects: Arc<P>,
    milestones: Arc<M>,
    escrows: Arc<E>,
    clock: Arc<T>,
    codes: Arc<G>,
    bus: Arc<B>,
    locks: ProjectLocks,
}

/// The all-in-memory service used by tests and single-process embedding.
pub type InMemoryEscrowService = EscrowService<
    InMemoryProjectRepository,
    InMemoryMilestoneRepository,
    InMemoryEscrowRepository,
    SystemTimeSource,
    RandomCodeGenerator,
    InMemoryEventBus,
>;

impl<P, M, E, T, G, B> EscrowService<P, M, E, T, G, B>
where
    P: ProjectRepository,
    M: MilestoneRepository,
    E: EscrowRepository,
    T: TimeSource,
    G: CodeGenerator,
    B: EventPublisher,
{
    /// Create a service over explicit port implementations.
    pub fn new(
        config: EscrowConfig,
        projects: Arc<P>,
        milestones: Arc<M>,
        escrows: Arc<E>,
        clock: Arc<T>,
        codes: Arc<G>,
        bus: Arc<B>,
    ) -> Self {
        Self {
            config,
            projects,
            milestones,
            escrows,
            clock,
            codes,
            bus,
            locks: ProjectLocks::new(),
        }
    }

    /// The project repository this service writes to (for wiring the
    /// notification relay against the same store).
    pub fn project_repository(&self) -> Arc<P> {
        self.projects.clone()
    }

    // ─────────────────────────────────────────────────────────
    // Shared helpers
    // ─────────────────────────────────────────────────────────

    /// Load a project or report `ProjectNotFound`.
    fn load_project(&self, id: ProjectId) -> EscrowResult<Project> {
        self.projects.get(id)?.ok_or(EscrowError::ProjectNotFound)
    }

    /// Draw join codes until one is unused, within the configured budget.
    ///
    /// The storage insert re-checks uniqueness, closing the window between
    /// this check and the write.
    fn allocate_join_code(&self) -> EscrowResult<JoinCode> {
        let budget = self.config.join_code_max_attempts.max(1);
        for _ in 0..budget {
            let candidate = self.codes.generate();
            if self.projects.find_by_code(&candidate)?.is_none() {
                return Ok(candidate);
            }
        }
        Err(EscrowError::CodeCollision { attempts: budget })
    }
}

impl InMemoryEscrowService {
    /// Fully in-memory service with the system clock and random codes.
    #[must_use]
    pub fn in_memory(bus: Arc<InMemoryEventBus>) -> Self {
        Self::new(
            EscrowConfig::default(),
            Arc::new(InMemoryProjectRepository::new()),
            Arc::new(InMemoryMilestoneRepository::new()),
            Arc::new(InMemoryEscrowRepository::new()),
            Arc::new(SystemTimeSource),
            Arc::new(RandomCodeGenerator),
            bus,
        )
    }
}
