//! Notification dispatch across the engine, bus, and relay.
//!
//! Transitions publish events; the relay turns them into per-recipient
//! notifications; a failing delivery channel never affects a transition.

#[cfg(test)]
mod tests {
    use crate::integration::support::{
        buyer, freelancer, project_with_milestones, Harness,
    };
    use escrow_bus::{EscrowEvent, EventFilter, EventTopic};
    use escrow_core::adapters::notify::{NotificationRelay, RecordingNotifier};
    use escrow_core::ports::inbound::EscrowApi;
    use escrow_types::{Role, UserId};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Await until the recorder holds at least `n` notifications.
    async fn wait_for_sent(recorder: &RecordingNotifier, n: usize) -> Vec<escrow_core::ports::outbound::Notification> {
        for _ in 0..100 {
            let sent = recorder.sent();
            if sent.len() >= n {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("relay did not deliver {n} notifications in time");
    }

    #[tokio::test]
    async fn test_transitions_publish_events_in_order() {
        let h = Harness::new();
        let mut sub = h.bus.subscribe(EventFilter::all());

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
        h.service
            .approve_milestone(milestone_id, buyer())
            .await
            .unwrap();

        let mut seen = Vec::new();
        while let Ok(Some(event)) = timeout(Duration::from_millis(100), sub.recv()).await {
            seen.push(event);
            if seen.len() == 6 {
                break;
            }
        }

        assert!(matches!(seen[0], EscrowEvent::ProjectCreated { .. }));
        assert!(matches!(
            seen[1],
            EscrowEvent::CounterpartyJoined {
                total_amount: 5000,
                ..
            }
        ));
        assert!(matches!(
            seen[2],
            EscrowEvent::EscrowFunded {
                total_amount: 5000,
                ..
            }
        ));
        assert!(matches!(seen[3], EscrowEvent::WorkSubmitted { .. }));
        assert!(matches!(
            seen[4],
            EscrowEvent::PaymentReleased { amount: 5000, .. }
        ));
        assert!(matches!(seen[5], EscrowEvent::ProjectCompleted { .. }));
    }

    #[tokio::test]
    async fn test_topic_filtered_subscriber_sees_money_only() {
        let h = Harness::new();
        let mut sub = h.bus.subscribe(EventFilter::topics(vec![EventTopic::Escrow]));

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
        h.service
            .approve_milestone(milestone_id, buyer())
            .await
            .unwrap();

        // First matching event is the funding, then the release.
        let first = timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(first, EscrowEvent::EscrowFunded { .. }));
        let second = timeout(Duration::from_millis(100), sub.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            second,
            EscrowEvent::PaymentReleased { amount: 5000, .. }
        ));
    }

    #[tokio::test]
    async fn test_relay_delivers_the_original_notification_catalogue() {
        let h = Harness::new();
        let recorder = Arc::new(RecordingNotifier::new());
        let _task = NotificationRelay::spawn(
            &h.bus,
            h.service.project_repository(),
            recorder.clone(),
        );

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
        h.service
            .approve_milestone(milestone_id, buyer())
            .await
            .unwrap();

        // created(→creator) + joined(→creator) + funded(→freelancer)
        // + submitted(→buyer) + released(→freelancer) + completed(→both)
        let sent = wait_for_sent(&recorder, 7).await;

        assert_eq!(sent[0].recipient, buyer()); // project created → creator
        assert_eq!(sent[1].recipient, buyer()); // joined → creator
        assert_eq!(sent[2].recipient, freelancer()); // funded → freelancer
        assert!(sent[2].body.contains("50.00"));
        assert_eq!(sent[3].recipient, buyer()); // submitted → buyer
        assert_eq!(sent[4].recipient, freelancer()); // released → freelancer
        assert!(sent[4].body.contains("50.00"));
        // completion notices go to both parties
        let completion_recipients: Vec<&UserId> =
            sent[5..7].iter().map(|n| &n.recipient).collect();
        assert!(completion_recipients.contains(&&buyer()));
        assert!(completion_recipients.contains(&&freelancer()));
    }

    #[tokio::test]
    async fn test_failing_sender_never_blocks_transitions() {
        let h = Harness::new();
        let recorder = Arc::new(RecordingNotifier::new());
        recorder.set_failing(true);
        let _task = NotificationRelay::spawn(
            &h.bus,
            h.service.project_repository(),
            recorder.clone(),
        );

        // The whole lifecycle succeeds with every delivery failing.
        let project = h
            .service
            .create_project(buyer(), project_with_milestones(&[5000]))
            .await
            .unwrap();
        h.service
            .join_project(project.code.as_str(), freelancer(), Role::Freelancer)
            .await
            .unwrap();
        h.service.fund_project(project.id, buyer()).await.unwrap();

        let overview = h
            .service
            .project_overview(project.id, buyer())
            .await
            .unwrap();
        let milestone_id = overview.milestones[0].id;
        h.service
            .submit_milestone(milestone_id, freelancer(), "v1".into())
            .await
            .unwrap();
        let outcome = h
            .service
            .approve_milestone(milestone_id, buyer())
            .await
            .unwrap();

        assert_eq!(outcome.escrow.released_amount(), 5000);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(recorder.sent().is_empty());
    }

    #[tokio::test]
    async fn test_dispute_reason_reaches_the_counterparty() {
        let h = Harness::new();
        let recorder = Arc::new(RecordingNotifier::new());
        let _task = NotificationRelay::spawn(
            &h.bus,
            h.service.project_repository(),
            recorder.clone(),
        );

        let project_id = h.active_project(&[5000]).await;
        h.service
            .raise_dispute(project_id, freelancer(), "invoice unpaid".into())
            .await
            .unwrap();

        // created + joined + funded + dispute notice.
        let sent = wait_for_sent(&recorder, 4).await;
        let dispute = sent.last().unwrap();
        assert_eq!(dispute.recipient, buyer());
        assert!(dispute.body.contains("invoice unpaid"));
    }
}
