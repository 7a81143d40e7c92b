//! `EscrowApi` implementation: the guarded transitions themselves.

use super::EscrowService;
use crate::domain::{milestone_total, EscrowAccount, Milestone, Project};
use crate::error::{EscrowError, EscrowResult};
use crate::ports::inbound::{
    ApprovalOutcome, EscrowApi, NewMilestone, NewProject, ProjectOverview, ProjectPreview,
};
use crate::ports::outbound::{
    CodeGenerator, EscrowRepository, MilestoneRepository, ProjectRepository, TimeSource,
};
use async_trait::async_trait;
use escrow_bus::{EscrowEvent, EventPublisher};
use escrow_types::{JoinCode, MilestoneId, MilestoneStatus, ProjectId, ProjectStatus, Role, UserId};
use tracing::{debug, info};

#[async_trait]
impl<P, M, E, T, G, B> EscrowApi for EscrowService<P, M, E, T, G, B>
where
    P: ProjectRepository,
    M: MilestoneRepository,
    E: EscrowRepository,
    T: TimeSource,
    G: CodeGenerator,
    B: EventPublisher,
{
    async fn create_project(&self, creator: UserId, input: NewProject) -> EscrowResult<Project> {
        let now = self.clock.now();
        let code = self.allocate_join_code()?;

        let project = Project::new(
            code,
            input.title,
            input.description,
            creator.clone(),
            input.creator_role,
            input.document_url,
            now,
            self.config.invite_ttl_ms,
        )?;

        // Validate the whole milestone batch before writing anything.
        let milestones: Vec<Milestone> = input
            .milestones
            .into_iter()
            .map(|m| Milestone::new(project.id, m.title, m.description, m.amount, m.deadline, now))
            .collect::<EscrowResult<_>>()?;

        self.projects.insert(project.clone())?;
        for milestone in milestones {
            self.milestones.insert(milestone)?;
        }

        info!(
            project_id = %project.id,
            code = %project.code,
            creator = %creator,
            role = %input.creator_role,
            "Project created"
        );
        self.bus
            .publish(EscrowEvent::ProjectCreated {
                project_id: project.id,
                title: project.title.clone(),
                code: project.code.clone(),
                created_by: creator,
            })
            .await;

        Ok(project)
    }

    async fn add_milestone(
        &self,
        project_id: ProjectId,
        caller: UserId,
        input: NewMilestone,
    ) -> EscrowResult<Milestone> {
        let lock = self.locks.lock_for(project_id);
        let _guard = lock.lock().await;

        let project = self.load_project(project_id)?;
        if project.created_by != caller {
            return Err(EscrowError::Forbidden {
                action: "only the creator can add milestones",
            });
        }
        // The ledger total is fixed at join time; after that the milestone
        // set is closed.
        if project.status() != ProjectStatus::AwaitingCounterparty {
            return Err(EscrowError::InvalidProjectState {
                action: "add milestones to",
                status: project.status(),
            });
        }

        let milestone = Milestone::new(
            project_id,
            input.title,
            input.description,
            input.amount,
            input.deadline,
            self.clock.now(),
        )?;
        self.milestones.insert(milestone.clone())?;

        info!(
            project_id = %project_id,
            milestone_id = %milestone.id,
            amount = milestone.amount(),
            "Milestone added"
        );
        Ok(milestone)
    }

    async fn join_project(&self, code: &str, joiner: UserId, role: Role) -> EscrowResult<Project> {
        let code: JoinCode = code
            .parse()
            .map_err(|e: escrow_types::JoinCodeError| EscrowError::validation(e.to_string()))?;
        let found = self
            .projects
            .find_by_code(&code)?
            .ok_or(EscrowError::ProjectNotFound)?;

        let lock = self.locks.lock_for(found.id);
        let _guard = lock.lock().await;

        // Re-read under the lock: a racing join may have won the slot.
        let mut project = self.load_project(found.id)?;

        // A previously swept invite reports expiry, not a filled slot.
        if project.status() == ProjectStatus::Cancelled {
            return Err(EscrowError::InviteExpired);
        }

        // Lazy expiry: flip to Cancelled first, then report the failure.
        if project.status() == ProjectStatus::AwaitingCounterparty
            && project.invite_expired(self.clock.now())
        {
            project.cancel_expired()?;
            self.projects.update(&project)?;
            info!(project_id = %project.id, "Invite expired; project cancelled");
            self.bus
                .publish(EscrowEvent::InviteExpired {
                    project_id: project.id,
                })
                .await;
            return Err(EscrowError::InviteExpired);
        }

        // The ledger total is the milestone sum at this instant; a project
        // with nothing to fund cannot be joined.
        let project_milestones = self.milestones.list_for_project(project.id)?;
        let total = milestone_total(&project_milestones)?;
        if total == 0 {
            return Err(EscrowError::validation("project has no milestones to fund"));
        }

        project.assign_counterparty(joiner.clone(), role)?;
        self.escrows.insert(EscrowAccount::open(project.id, total))?;
        self.projects.update(&project)?;

        info!(
            project_id = %project.id,
            joiner = %joiner,
            role = %role,
            total_amount = total,
            "Counterparty joined; escrow opened"
        );
        self.bus
            .publish(EscrowEvent::CounterpartyJoined {
                project_id: project.id,
                joiner,
                role,
                total_amount: total,
            })
            .await;

        Ok(project)
    }

    async fn fund_project(
        &self,
        project_id: ProjectId,
        caller: UserId,
    ) -> EscrowResult<EscrowAccount> {
        let lock = self.locks.lock_for(project_id);
        let _guard = lock.lock().await;

        let mut project = self.load_project(project_id)?;
        if project.buyer_id() != Some(&caller) {
            return Err(EscrowError::Forbidden {
                action: "only the buyer can fund the escrow",
            });
        }

        let mut escrow = self
            .escrows
            .find_by_project(project_id)?
            .ok_or(EscrowError::EscrowNotFound)?;

        escrow.fund(self.clock.now())?;
        project.mark_funded()?;

        self.escrows.update(&escrow)?;
        self.projects.update(&project)?;

        info!(
            project_id = %project_id,
            total_amount = escrow.total_amount(),
            "Escrow funded; project active"
        );
        self.bus
            .publish(EscrowEvent::EscrowFunded {
                project_id,
                total_amount: escrow.total_amount(),
            })
            .await;

        Ok(escrow)
    }

    async fn submit_milestone(
        &self,
        milestone_id: MilestoneId,
        caller: UserId,
        submission_url: String,
    ) -> EscrowResult<Milestone> {
        if submission_url.trim().is_empty() {
            return Err(EscrowError::validation("submission reference must not be empty"));
        }

        let found = self
            .milestones
            .get(milestone_id)?
            .ok_or(EscrowError::MilestoneNotFound)?;
        let lock = self.locks.lock_for(found.project_id);
        let _guard = lock.lock().await;

        // Re-read both entities under the lock.
        let mut milestone = self
            .milestones
            .get(milestone_id)?
            .ok_or(EscrowError::MilestoneNotFound)?;
        let mut project = self.load_project(milestone.project_id)?;

        if project.freelancer_id() != Some(&caller) {
            return Err(EscrowError::Forbidden {
                action: "only the freelancer can submit work",
            });
        }

        milestone.submit(submission_url)?;
        project.begin_review()?;

        self.milestones.update(&milestone)?;
        self.projects.update(&project)?;

        info!(
            project_id = %project.id,
            milestone_id = %milestone.id,
            "Work submitted; project under review"
        );
        self.bus
            .publish(EscrowEvent::WorkSubmitted {
                project_id: project.id,
                milestone_id: milestone.id,
                milestone_title: milestone.title.clone(),
            })
            .await;

        Ok(milestone)
    }

    async fn approve_milestone(
        &self,
        milestone_id: MilestoneId,
        caller: UserId,
    ) -> EscrowResult<ApprovalOutcome> {
        let found = self
            .milestones
            .get(milestone_id)?
            .ok_or(EscrowError::MilestoneNotFound)?;
        let lock = self.locks.lock_for(found.project_id);
        let _guard = lock.lock().await;

        let mut milestone = self
            .milestones
            .get(milestone_id)?
            .ok_or(EscrowError::MilestoneNotFound)?;
        let mut project = self.load_project(milestone.project_id)?;

        if project.buyer_id() != Some(&caller) {
            return Err(EscrowError::Forbidden {
                action: "only the buyer can approve work",
            });
        }
        // A disputed or otherwise frozen project blocks the release before
        // any money moves.
        if project.status() != ProjectStatus::UnderReview {
            return Err(EscrowError::InvalidProjectState {
                action: "approve work on",
                status: project.status(),
            });
        }

        let mut escrow = self
            .escrows
            .find_by_project(project.id)?
            .ok_or(EscrowError::EscrowNotFound)?;

        // Milestone approval and ledger release stand or fall together;
        // nothing is persisted until both have passed their guards.
        milestone.approve()?;
        escrow.release(milestone.amount())?;

        let all_approved = self
            .milestones
            .list_for_project(project.id)?
            .iter()
            .all(|m| m.id == milestone.id || m.status() == MilestoneStatus::Approved);
        if all_approved {
            project.complete()?;
        } else {
            project.resume_active()?;
        }

        self.milestones.update(&milestone)?;
        self.escrows.update(&escrow)?;
        self.projects.update(&project)?;

        info!(
            project_id = %project.id,
            milestone_id = %milestone.id,
            amount = milestone.amount(),
            released_total = escrow.released_amount(),
            project_status = %project.status(),
            "Milestone approved; funds released"
        );
        self.bus
            .publish(EscrowEvent::PaymentReleased {
                project_id: project.id,
                milestone_id: milestone.id,
                amount: milestone.amount(),
            })
            .await;
        if all_approved {
            self.bus
                .publish(EscrowEvent::ProjectCompleted {
                    project_id: project.id,
                })
                .await;
        }

        Ok(ApprovalOutcome {
            milestone,
            escrow,
            project_status: project.status(),
        })
    }

    async fn request_revision(
        &self,
        milestone_id: MilestoneId,
        caller: UserId,
    ) -> EscrowResult<Milestone> {
        let found = self
            .milestones
            .get(milestone_id)?
            .ok_or(EscrowError::MilestoneNotFound)?;
        let lock = self.locks.lock_for(found.project_id);
        let _guard = lock.lock().await;

        let mut milestone = self
            .milestones
            .get(milestone_id)?
            .ok_or(EscrowError::MilestoneNotFound)?;
        let mut project = self.load_project(milestone.project_id)?;

        if project.buyer_id() != Some(&caller) {
            return Err(EscrowError::Forbidden {
                action: "only the buyer can request revisions",
            });
        }
        if project.status() != ProjectStatus::UnderReview {
            return Err(EscrowError::InvalidProjectState {
                action: "request revisions on",
                status: project.status(),
            });
        }

        milestone.request_revision()?;
        project.resume_active()?;

        self.milestones.update(&milestone)?;
        self.projects.update(&project)?;

        info!(
            project_id = %project.id,
            milestone_id = %milestone.id,
            "Revision requested; project active again"
        );
        self.bus
            .publish(EscrowEvent::RevisionRequested {
                project_id: project.id,
                milestone_id: milestone.id,
                milestone_title: milestone.title.clone(),
            })
            .await;

        Ok(milestone)
    }

    async fn raise_dispute(
        &self,
        project_id: ProjectId,
        caller: UserId,
        reason: String,
    ) -> EscrowResult<Project> {
        let lock = self.locks.lock_for(project_id);
        let _guard = lock.lock().await;

        let mut project = self.load_project(project_id)?;
        if !project.is_participant(&caller) {
            return Err(EscrowError::Forbidden {
                action: "only participants can raise a dispute",
            });
        }

        project.dispute()?;
        self.projects.update(&project)?;

        info!(project_id = %project_id, raised_by = %caller, "Dispute raised");
        self.bus
            .publish(EscrowEvent::DisputeRaised {
                project_id,
                raised_by: caller,
                reason,
            })
            .await;

        Ok(project)
    }

    async fn sweep_expired_invites(&self) -> EscrowResult<usize> {
        let now = self.clock.now();
        let candidates = self.projects.list_awaiting_counterparty()?;
        let mut swept = 0usize;

        for candidate in candidates {
            if !candidate.invite_expired(now) {
                continue;
            }
            let lock = self.locks.lock_for(candidate.id);
            let _guard = lock.lock().await;

            // Re-check under the lock: a join may have slipped in.
            let mut project = match self.projects.get(candidate.id)? {
                Some(p) if p.status() == ProjectStatus::AwaitingCounterparty => p,
                _ => continue,
            };
            project.cancel_expired()?;
            self.projects.update(&project)?;
            swept += 1;

            info!(project_id = %project.id, "Invite expired; project cancelled by sweep");
            self.bus
                .publish(EscrowEvent::InviteExpired {
                    project_id: project.id,
                })
                .await;
        }

        debug!(swept, "Expired-invite sweep finished");
        Ok(swept)
    }

    async fn project_overview(
        &self,
        project_id: ProjectId,
        caller: UserId,
    ) -> EscrowResult<ProjectOverview> {
        let project = self.load_project(project_id)?;
        if !project.is_participant(&caller) {
            return Err(EscrowError::Forbidden {
                action: "only participants can view a project",
            });
        }
        let milestones = self.milestones.list_for_project(project_id)?;
        let escrow = self.escrows.find_by_project(project_id)?;
        Ok(ProjectOverview {
            project,
            milestones,
            escrow,
        })
    }

    async fn project_by_code(&self, code: &str) -> EscrowResult<ProjectPreview> {
        let code: JoinCode = code
            .parse()
            .map_err(|e: escrow_types::JoinCodeError| EscrowError::validation(e.to_string()))?;
        let project = self
            .projects
            .find_by_code(&code)?
            .ok_or(EscrowError::ProjectNotFound)?;
        let milestones = self.milestones.list_for_project(project.id)?;
        Ok(ProjectPreview {
            project,
            milestones,
        })
    }

    async fn projects_for_user(&self, user: &UserId) -> EscrowResult<Vec<Project>> {
        self.projects.list_for_user(user)
    }
}
