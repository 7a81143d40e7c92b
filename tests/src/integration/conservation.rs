//! Randomized ledger invariant runs.
//!
//! Drives random operation sequences against funded projects and checks
//! the accounting invariants after every single operation: conservation,
//! monotonically non-decreasing release, funded never reverting, and the
//! completion closure.

#[cfg(test)]
mod tests {
    use crate::integration::support::{buyer, freelancer, Harness};
    use escrow_core::ports::inbound::EscrowApi;
    use escrow_types::{Amount, MilestoneStatus, ProjectStatus};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Assert every ledger invariant that must survive any operation.
    async fn check_invariants(
        h: &Harness,
        project_id: escrow_types::ProjectId,
        previously_released: Amount,
    ) -> Amount {
        let overview = h
            .service
            .project_overview(project_id, buyer())
            .await
            .expect("overview");
        let escrow = overview.escrow.expect("ledger exists after join");

        assert!(escrow.conservation_holds(), "conservation violated");
        assert!(
            escrow.released_amount() >= previously_released,
            "released amount decreased"
        );
        assert!(escrow.funded(), "funded flag reverted");

        // Completion closure: Completed iff every milestone is Approved.
        let all_approved = overview
            .milestones
            .iter()
            .all(|m| m.status() == MilestoneStatus::Approved);
        let completed = overview.project.status() == ProjectStatus::Completed;
        assert_eq!(
            completed, all_approved,
            "completion out of sync with milestone statuses"
        );

        escrow.released_amount()
    }

    #[tokio::test]
    async fn test_random_operation_sequences_preserve_invariants() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for round in 0..20 {
            let h = Harness::new();

            // 1..=4 milestones with uneven amounts.
            let amounts: Vec<Amount> = (0..rng.gen_range(1..=4))
                .map(|_| rng.gen_range(1..=10_000))
                .collect();
            let total: Amount = amounts.iter().sum();
            let project_id = h.active_project(&amounts).await;

            let milestone_ids: Vec<_> = h
                .service
                .project_overview(project_id, buyer())
                .await
                .unwrap()
                .milestones
                .iter()
                .map(|m| m.id)
                .collect();

            let mut released_watermark = 0;
            for _ in 0..40 {
                let milestone_id = milestone_ids[rng.gen_range(0..milestone_ids.len())];
                // Errors are expected constantly (wrong state, wrong
                // actor); invariants must hold regardless of outcome.
                match rng.gen_range(0..4u8) {
                    0 => {
                        let _ = h
                            .service
                            .submit_milestone(milestone_id, freelancer(), "work".into())
                            .await;
                    }
                    1 => {
                        let _ = h.service.approve_milestone(milestone_id, buyer()).await;
                    }
                    2 => {
                        let _ = h.service.request_revision(milestone_id, buyer()).await;
                    }
                    _ => {
                        // Actor confusion: buyer submitting, freelancer
                        // approving. Must be rejected without mutation.
                        let _ = h
                            .service
                            .submit_milestone(milestone_id, buyer(), "nope".into())
                            .await;
                        let _ = h
                            .service
                            .approve_milestone(milestone_id, freelancer())
                            .await;
                    }
                }
                released_watermark =
                    check_invariants(&h, project_id, released_watermark).await;
            }

            // Drive the project home: submit + approve everything left.
            for milestone_id in &milestone_ids {
                let _ = h
                    .service
                    .submit_milestone(*milestone_id, freelancer(), "final".into())
                    .await;
                let _ = h.service.approve_milestone(*milestone_id, buyer()).await;
                released_watermark =
                    check_invariants(&h, project_id, released_watermark).await;
            }

            let overview = h
                .service
                .project_overview(project_id, buyer())
                .await
                .unwrap();
            let escrow = overview.escrow.unwrap();
            assert_eq!(
                escrow.released_amount(),
                total,
                "round {round}: full settlement releases the exact total"
            );
            assert_eq!(escrow.remaining_amount(), 0);
            assert_eq!(overview.project.status(), ProjectStatus::Completed);
        }
    }

    /// Approvals in a random order still settle to the exact total.
    #[tokio::test]
    async fn test_shuffled_approval_order_settles_exactly() {
        let mut rng = StdRng::seed_from_u64(42);
        let h = Harness::new();
        let amounts = [700, 1300, 2500, 4500];
        let project_id = h.active_project(&amounts).await;

        let mut milestone_ids: Vec<_> = h
            .service
            .project_overview(project_id, buyer())
            .await
            .unwrap()
            .milestones
            .iter()
            .map(|m| m.id)
            .collect();

        // Fisher-Yates shuffle.
        for i in (1..milestone_ids.len()).rev() {
            let j = rng.gen_range(0..=i);
            milestone_ids.swap(i, j);
        }

        for milestone_id in milestone_ids {
            h.service
                .submit_milestone(milestone_id, freelancer(), "work".into())
                .await
                .unwrap();
            h.service
                .approve_milestone(milestone_id, buyer())
                .await
                .unwrap();
        }

        let overview = h
            .service
            .project_overview(project_id, buyer())
            .await
            .unwrap();
        let escrow = overview.escrow.unwrap();
        assert_eq!(escrow.released_amount(), 9000);
        assert_eq!(escrow.remaining_amount(), 0);
        assert_eq!(overview.project.status(), ProjectStatus::Completed);
    }
}
