//! Notification dispatch.
//!
//! The engine publishes lifecycle events to the bus and moves on; this
//! module turns those events into per-recipient notifications and hands
//! them to a [`NotificationSender`]. Delivery is fire-and-forget,
//! at-most-once: a failed send is logged and dropped, and can never roll
//! back the transition that triggered it.

use crate::ports::outbound::{Notification, NotificationSender, NotifyError, ProjectRepository};
use async_trait::async_trait;
use escrow_bus::{EscrowEvent, EventFilter, InMemoryEventBus};
use escrow_types::{Amount, UserId};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Render minor currency units as a major-unit decimal ("5000" → "50.00").
fn format_amount(amount: Amount) -> String {
    format!("{}.{:02}", amount / 100, amount % 100)
}

/// Sender that writes notifications to the log. The default delivery
/// channel when no real transport is wired in, and a readable fallback
/// when one is.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "Notification sent"
        );
        Ok(())
    }
}

/// Test sender that records everything it is asked to deliver and can be
/// told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    fail: std::sync::atomic::AtomicBool,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything successfully handed to this sender so far.
    #[must_use]
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().clone()
    }

    /// Make every subsequent send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.fail
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(NotifyError {
                reason: "recording sender set to fail".into(),
            });
        }
        self.sent.lock().push(notification);
        Ok(())
    }
}

/// Bridges the event bus to a [`NotificationSender`].
///
/// Recipients are resolved from project storage at dispatch time, the way
/// they were at transition time; a project deleted in between simply
/// produces no notifications.
pub struct NotificationRelay;

impl NotificationRelay {
    /// Subscribe to the bus and forward events on a background task.
    ///
    /// The task ends when the bus is dropped. Send failures and recipient
    /// lookups that come up empty are logged and skipped.
    pub fn spawn(
        bus: &InMemoryEventBus,
        projects: Arc<dyn ProjectRepository>,
        sender: Arc<dyn NotificationSender>,
    ) -> JoinHandle<()> {
        let mut subscription = bus.subscribe(EventFilter::all());
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                for notification in notifications_for(&event, projects.as_ref()) {
                    if let Err(err) = sender.send(notification).await {
                        warn!(error = %err, "Notification dropped");
                    }
                }
            }
        })
    }
}

/// Map one event to the notifications it should produce.
fn notifications_for(event: &EscrowEvent, projects: &dyn ProjectRepository) -> Vec<Notification> {
    let project = match projects.get(event.project_id()) {
        Ok(Some(p)) => p,
        Ok(None) => {
            warn!(project_id = %event.project_id(), "Notification skipped: project gone");
            return Vec::new();
        }
        Err(err) => {
            warn!(error = %err, "Notification skipped: project lookup failed");
            return Vec::new();
        }
    };

    let to = |recipient: &UserId, subject: String, body: String| Notification {
        recipient: recipient.clone(),
        subject,
        body,
    };

    match event {
        EscrowEvent::ProjectCreated { title, code, created_by, .. } => vec![to(
            created_by,
            format!("Project \"{title}\" created"),
            format!("Share join code {code} with your counterparty. It expires in 48 hours."),
        )],

        EscrowEvent::CounterpartyJoined { joiner, role, total_amount, .. } => vec![to(
            &project.created_by,
            format!("{joiner} joined \"{}\"", project.title),
            format!(
                "{joiner} joined as {role}. Escrow total: {}.",
                format_amount(*total_amount)
            ),
        )],

        EscrowEvent::InviteExpired { .. } => vec![to(
            &project.created_by,
            format!("Invite for \"{}\" expired", project.title),
            "Nobody joined before the code expired; the project was cancelled.".into(),
        )],

        EscrowEvent::EscrowFunded { total_amount, .. } => project
            .freelancer_id()
            .map(|freelancer| {
                to(
                    freelancer,
                    format!("Escrow funded for \"{}\"", project.title),
                    format!(
                        "The buyer deposited {}. You can start work.",
                        format_amount(*total_amount)
                    ),
                )
            })
            .into_iter()
            .collect(),

        EscrowEvent::WorkSubmitted { milestone_title, .. } => project
            .buyer_id()
            .map(|buyer| {
                to(
                    buyer,
                    format!("Work submitted on \"{}\"", project.title),
                    format!("Milestone \"{milestone_title}\" is ready for your review."),
                )
            })
            .into_iter()
            .collect(),

        EscrowEvent::RevisionRequested { milestone_title, .. } => project
            .freelancer_id()
            .map(|freelancer| {
                to(
                    freelancer,
                    format!("Revision requested on \"{}\"", project.title),
                    format!("The buyer asked for changes to \"{milestone_title}\"."),
                )
            })
            .into_iter()
            .collect(),

        EscrowEvent::PaymentReleased { amount, .. } => project
            .freelancer_id()
            .map(|freelancer| {
                to(
                    freelancer,
                    format!("Payment released for \"{}\"", project.title),
                    format!("{} has been released from escrow.", format_amount(*amount)),
                )
            })
            .into_iter()
            .collect(),

        EscrowEvent::ProjectCompleted { .. } => [project.buyer_id(), project.freelancer_id()]
            .into_iter()
            .flatten()
            .map(|party| {
                to(
                    party,
                    format!("\"{}\" completed", project.title),
                    "Every milestone is approved and paid out.".into(),
                )
            })
            .collect(),

        EscrowEvent::DisputeRaised { raised_by, reason, .. } => {
            [project.buyer_id(), project.freelancer_id()]
                .into_iter()
                .flatten()
                .filter(|party| *party != raised_by)
                .map(|party| {
                    to(
                        party,
                        format!("Dispute raised on \"{}\"", project.title),
                        format!("{raised_by} raised a dispute: {reason}"),
                    )
                })
                .collect()
        }
    }
}
