//! Races on the same project: the guards that keep money single-spent.
//!
//! Each test fires concurrent tasks at one aggregate and asserts exactly
//! one winner, per the engine's per-project atomic-unit guarantee.

#[cfg(test)]
mod tests {
    use crate::integration::support::{buyer, freelancer, project_with_milestones, Harness};
    use escrow_core::ports::inbound::EscrowApi;
    use escrow_core::EscrowError;
    use escrow_types::{Role, UserId};
    use std::sync::Arc;
    use tokio::sync::Barrier;

    /// Two concurrent approvals of one submitted milestone: one succeeds,
    /// one observes the already-applied transition, and the ledger is
    /// debited exactly once.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_double_approve_releases_once() {
        let h = Harness::new();
        let project_id = h.active_project(&[5000]).await;
        let overview = h
            .service
            .project_overview(project_id, buyer())
            .await
            .unwrap();
        let milestone_id = overview.milestones[0].id;

        h.service
            .submit_milestone(milestone_id, freelancer(), "v1".into())
            .await
            .unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for _ in 0..2 {
            let service = h.service.clone();
            let barrier = barrier.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                service.approve_milestone(milestone_id, buyer()).await
            }));
        }

        let mut oks = 0;
        let mut errs = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(outcome) => {
                    oks += 1;
                    assert_eq!(outcome.escrow.released_amount(), 5000);
                }
                Err(
                    EscrowError::InvalidMilestoneState { .. }
                    | EscrowError::InvalidProjectState { .. },
                ) => errs += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((oks, errs), (1, 1));

        let overview = h
            .service
            .project_overview(project_id, buyer())
            .await
            .unwrap();
        let escrow = overview.escrow.unwrap();
        assert_eq!(escrow.released_amount(), 5000);
        assert_eq!(escrow.remaining_amount(), 0);
        assert!(escrow.conservation_holds());
    }

    /// Two joiners race on the same code; exactly one fills the slot.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_join_exclusivity() {
        let h = Harness::new();
        let project = h
            .service
            .create_project(buyer(), project_with_milestones(&[5000]))
            .await
            .unwrap();
        let code = project.code.as_str().to_owned();

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for joiner in ["worker-a", "worker-b"] {
            let service = h.service.clone();
            let barrier = barrier.clone();
            let code = code.clone();
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                service
                    .join_project(&code, UserId::from(joiner), Role::Freelancer)
                    .await
            }));
        }

        let mut winners = Vec::new();
        let mut losers = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(joined) => winners.push(joined),
                Err(EscrowError::AlreadyJoined) => losers += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(winners.len(), 1);
        assert_eq!(losers, 1);

        // The stored project names exactly the winning freelancer.
        let overview = h
            .service
            .project_overview(project.id, buyer())
            .await
            .unwrap();
        assert_eq!(
            overview.project.freelancer_id(),
            winners[0].freelancer_id()
        );
    }

    /// Two funding calls race; the ledger is funded exactly once and the
    /// loser sees the hard AlreadyFunded error.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_fund_is_single_shot() {
        let h = Harness::new();
        let project = h
            .service
            .create_project(buyer(), project_with_milestones(&[5000]))
            .await
            .unwrap();
        h.service
            .join_project(project.code.as_str(), freelancer(), Role::Freelancer)
            .await
            .unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let mut handles = Vec::new();
        for _ in 0..2 {
            let service = h.service.clone();
            let barrier = barrier.clone();
            let project_id = project.id;
            handles.push(tokio::spawn(async move {
                barrier.wait().await;
                service.fund_project(project_id, buyer()).await
            }));
        }

        let mut oks = 0;
        let mut already = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(escrow) => {
                    oks += 1;
                    assert!(escrow.funded());
                }
                Err(EscrowError::AlreadyFunded) => already += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!((oks, already), (1, 1));
    }

    /// Unrelated projects make progress concurrently without interference.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_independent_projects_do_not_contend() {
        let h = Harness::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = h.service.clone();
            let project_id = h.active_project(&[1000]).await;
            handles.push(tokio::spawn(async move {
                let overview = service
                    .project_overview(project_id, buyer())
                    .await
                    .unwrap();
                let milestone_id = overview.milestones[0].id;
                service
                    .submit_milestone(milestone_id, freelancer(), "w".into())
                    .await
                    .unwrap();
                service
                    .approve_milestone(milestone_id, buyer())
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            let outcome = handle.await.unwrap();
            assert_eq!(outcome.escrow.released_amount(), 1000);
        }
    }
}
