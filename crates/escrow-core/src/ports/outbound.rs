//! Outbound (Driven) ports for the escrow engine.
//!
//! These traits define the engine's dependencies: entity storage, the
//! clock, join-code generation, and the notification sender. Storage
//! traits are synchronous; the atomic read-modify-write unit required by
//! the engine is provided by the service's per-project lock, not by the
//! repository.

use crate::domain::{EscrowAccount, Milestone, Project};
use crate::error::EscrowResult;
use async_trait::async_trait;
use escrow_types::{JoinCode, MilestoneId, ProjectId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────────────────

/// Project storage.
pub trait ProjectRepository: Send + Sync {
    /// Store a new project. Fails with a storage error if the id or join
    /// code is already in use (the service checks the code first; this is
    /// the backstop for the check-then-insert window).
    fn insert(&self, project: Project) -> EscrowResult<()>;

    fn get(&self, id: ProjectId) -> EscrowResult<Option<Project>>;

    /// Look up a project by its (normalized) join code.
    fn find_by_code(&self, code: &JoinCode) -> EscrowResult<Option<Project>>;

    /// Persist a mutated project. Fails with `ProjectNotFound` if absent.
    fn update(&self, project: &Project) -> EscrowResult<()>;

    /// Projects the user created or participates in.
    fn list_for_user(&self, user: &UserId) -> EscrowResult<Vec<Project>>;

    /// Projects still waiting for a counterparty (sweep candidates).
    fn list_awaiting_counterparty(&self) -> EscrowResult<Vec<Project>>;
}

/// Milestone storage.
pub trait MilestoneRepository: Send + Sync {
    fn insert(&self, milestone: Milestone) -> EscrowResult<()>;

    fn get(&self, id: MilestoneId) -> EscrowResult<Option<Milestone>>;

    /// Persist a mutated milestone. Fails with `MilestoneNotFound` if
    /// absent.
    fn update(&self, milestone: &Milestone) -> EscrowResult<()>;

    /// All milestones of a project, ordered by deadline then creation.
    fn list_for_project(&self, project_id: ProjectId) -> EscrowResult<Vec<Milestone>>;
}

/// Escrow ledger storage. One row per project, enforced at insert.
pub trait EscrowRepository: Send + Sync {
    /// Store a freshly opened ledger. Fails with `EscrowAlreadyExists` if
    /// the project already has one.
    fn insert(&self, escrow: EscrowAccount) -> EscrowResult<()>;

    fn find_by_project(&self, project_id: ProjectId) -> EscrowResult<Option<EscrowAccount>>;

    /// Persist a mutated ledger. Fails with `EscrowNotFound` if absent.
    fn update(&self, escrow: &EscrowAccount) -> EscrowResult<()>;
}

// ─────────────────────────────────────────────────────────
// Clock
// ─────────────────────────────────────────────────────────

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time; invite expiry is
/// evaluated against this clock at access time.
pub trait TimeSource: Send + Sync {
    /// Current timestamp in milliseconds since the UNIX epoch.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Manually advanced time source for tests and simulations.
pub struct ManualTimeSource {
    time: std::sync::atomic::AtomicU64,
}

impl ManualTimeSource {
    #[must_use]
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.time
            .fetch_add(ms, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn set(&self, time: Timestamp) {
        self.time.store(time, std::sync::atomic::Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}

// ─────────────────────────────────────────────────────────
// Join-code generation
// ─────────────────────────────────────────────────────────

/// Source of candidate join codes.
///
/// Uniqueness is the service's job (check against storage, bounded
/// retries); the generator only draws candidates.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> JoinCode;
}

/// Draws uniformly random codes from the join-code alphabet.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> JoinCode {
        JoinCode::random(&mut rand::thread_rng())
    }
}

/// Cycles through a fixed list of codes. For collision-handling tests.
pub struct FixedCodeGenerator {
    codes: Vec<JoinCode>,
    next: std::sync::atomic::AtomicUsize,
}

impl FixedCodeGenerator {
    /// # Panics
    ///
    /// Panics if `codes` is empty.
    #[must_use]
    pub fn new(codes: Vec<JoinCode>) -> Self {
        assert!(!codes.is_empty(), "FixedCodeGenerator needs at least one code");
        Self {
            codes,
            next: std::sync::atomic::AtomicUsize::new(0),
        }
    }
}

impl CodeGenerator for FixedCodeGenerator {
    fn generate(&self) -> JoinCode {
        let i = self
            .next
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        self.codes[i % self.codes.len()].clone()
    }
}

// ─────────────────────────────────────────────────────────
// Notifications
// ─────────────────────────────────────────────────────────

/// A human-readable notification addressed to one participant.
///
/// The engine resolves only the recipient's opaque id; turning that into
/// an email address or push channel is the sender's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: UserId,
    pub subject: String,
    pub body: String,
}

/// Failure to deliver a notification. Logged and swallowed by the relay;
/// never propagated into a state transition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("notification delivery failed: {reason}")]
pub struct NotifyError {
    pub reason: String,
}

/// Delivery channel for notifications (email, push, ...).
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError>;
}
