//! In-memory repository implementations.
//!
//! The default storage for tests and single-process embedding. Each
//! repository is a `parking_lot::RwLock` over a `HashMap`; the uniqueness
//! rules a relational store would enforce (join-code uniqueness, one
//! ledger per project) are enforced here at insert.

use crate::domain::{EscrowAccount, Milestone, Project};
use crate::error::{EscrowError, EscrowResult};
use crate::ports::outbound::{EscrowRepository, MilestoneRepository, ProjectRepository};
use escrow_types::{JoinCode, MilestoneId, ProjectId, UserId};
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory implementation of `ProjectRepository`.
#[derive(Default)]
pub struct InMemoryProjectRepository {
    projects: RwLock<HashMap<ProjectId, Project>>,
    /// Join-code uniqueness index.
    by_code: RwLock<HashMap<JoinCode, ProjectId>>,
}

impl InMemoryProjectRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectRepository for InMemoryProjectRepository {
    fn insert(&self, project: Project) -> EscrowResult<()> {
        let mut by_code = self.by_code.write();
        let mut projects = self.projects.write();
        if by_code.contains_key(&project.code) {
            return Err(EscrowError::Storage {
                reason: "join code already in use".into(),
            });
        }
        if projects.contains_key(&project.id) {
            return Err(EscrowError::Storage {
                reason: "project id already in use".into(),
            });
        }
        by_code.insert(project.code.clone(), project.id);
        projects.insert(project.id, project);
        Ok(())
    }

    fn get(&self, id: ProjectId) -> EscrowResult<Option<Project>> {
        Ok(self.projects.read().get(&id).cloned())
    }

    fn find_by_code(&self, code: &JoinCode) -> EscrowResult<Option<Project>> {
        let by_code = self.by_code.read();
        let Some(id) = by_code.get(code) else {
            return Ok(None);
        };
        Ok(self.projects.read().get(id).cloned())
    }

    fn update(&self, project: &Project) -> EscrowResult<()> {
        let mut projects = self.projects.write();
        match projects.get_mut(&project.id) {
            Some(slot) => {
                *slot = project.clone();
                Ok(())
            }
            None => Err(EscrowError::ProjectNotFound),
        }
    }

    fn list_for_user(&self, user: &UserId) -> EscrowResult<Vec<Project>> {
        let mut found: Vec<Project> = self
            .projects
            .read()
            .values()
            .filter(|p| p.is_participant(user))
            .cloned()
            .collect();
        found.sort_by_key(|p| p.created_at);
        Ok(found)
    }

    fn list_awaiting_counterparty(&self) -> EscrowResult<Vec<Project>> {
        Ok(self
            .projects
            .read()
            .values()
            .filter(|p| p.status() == escrow_types::ProjectStatus::AwaitingCounterparty)
            .cloned()
            .collect())
    }
}

/// In-memory implementation of `MilestoneRepository`.
#[derive(Default)]
pub struct InMemoryMilestoneRepository {
    milestones: RwLock<HashMap<MilestoneId, Milestone>>,
}

impl InMemoryMilestoneRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MilestoneRepository for InMemoryMilestoneRepository {
    fn insert(&self, milestone: Milestone) -> EscrowResult<()> {
        let mut milestones = self.milestones.write();
        if milestones.contains_key(&milestone.id) {
            return Err(EscrowError::Storage {
                reason: "milestone id already in use".into(),
            });
        }
        milestones.insert(milestone.id, milestone);
        Ok(())
    }

    fn get(&self, id: MilestoneId) -> EscrowResult<Option<Milestone>> {
        Ok(self.milestones.read().get(&id).cloned())
    }

    fn update(&self, milestone: &Milestone) -> EscrowResult<()> {
        let mut milestones = self.milestones.write();
        match milestones.get_mut(&milestone.id) {
            Some(slot) => {
                *slot = milestone.clone();
                Ok(())
            }
            None => Err(EscrowError::MilestoneNotFound),
        }
    }

    fn list_for_project(&self, project_id: ProjectId) -> EscrowResult<Vec<Milestone>> {
        let mut found: Vec<Milestone> = self
            .milestones
            .read()
            .values()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.deadline
                .cmp(&b.deadline)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.title.cmp(&b.title))
        });
        Ok(found)
    }
}

/// In-memory implementation of `EscrowRepository`.
#[derive(Default)]
pub struct InMemoryEscrowRepository {
    /// Keyed by project: one ledger per project.
    by_project: RwLock<HashMap<ProjectId, EscrowAccount>>,
}

impl InMemoryEscrowRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EscrowRepository for InMemoryEscrowRepository {
    fn insert(&self, escrow: EscrowAccount) -> EscrowResult<()> {
        let mut by_project = self.by_project.write();
        if by_project.contains_key(&escrow.project_id) {
            return Err(EscrowError::EscrowAlreadyExists);
        }
        by_project.insert(escrow.project_id, escrow);
        Ok(())
    }

    fn find_by_project(&self, project_id: ProjectId) -> EscrowResult<Option<EscrowAccount>> {
        Ok(self.by_project.read().get(&project_id).cloned())
    }

    fn update(&self, escrow: &EscrowAccount) -> EscrowResult<()> {
        let mut by_project = self.by_project.write();
        match by_project.get_mut(&escrow.project_id) {
            Some(slot) => {
                *slot = escrow.clone();
                Ok(())
            }
            None => Err(EscrowError::EscrowNotFound),
        }
    }
}
