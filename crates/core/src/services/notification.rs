//! Notification dispatch.
//!
//! Services report domain events through the [`Notifier`] trait so that
//! delivery (email, push, ...) stays outside the core. Delivery failures
//! never fail the operation that triggered them.

use async_trait::async_trait;
use denuncia_common::AppResult;
use denuncia_db::entities::complaint::ComplaintStatus;
use std::sync::Arc;

/// Events worth telling someone about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A complaint was filed; sent to the auditors of its locality.
    ComplaintCreated {
        complaint_id: String,
        title: String,
        auditor_ids: Vec<String>,
    },
    /// The public search id of a new complaint; sent to its publisher.
    SearchIdIssued {
        complaint_id: String,
        search_id: String,
        publisher_id: String,
    },
    /// An auditor reviewed a complaint; sent to its publisher.
    ComplaintModerated {
        complaint_id: String,
        publisher_id: String,
        status: ComplaintStatus,
        rejection_reason: Option<String>,
    },
    /// A public agency commented on a complaint; sent to its publisher.
    AgencyCommented {
        complaint_id: String,
        publisher_id: String,
        agency_id: String,
        comment_id: String,
    },
}

impl NotificationEvent {
    /// Short name used in logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ComplaintCreated { .. } => "complaint_created",
            Self::SearchIdIssued { .. } => "search_id_issued",
            Self::ComplaintModerated { .. } => "complaint_moderated",
            Self::AgencyCommented { .. } => "agency_commented",
        }
    }
}

/// Sink for notification events.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one event.
    async fn notify(&self, event: &NotificationEvent) -> AppResult<()>;
}

/// A no-op notifier for testing or when notifications are disabled.
#[derive(Clone, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(&self, _event: &NotificationEvent) -> AppResult<()> {
        Ok(())
    }
}

/// Notifier that only writes events to the log.
#[derive(Clone, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, event: &NotificationEvent) -> AppResult<()> {
        tracing::info!(kind = event.kind(), ?event, "Notification");
        Ok(())
    }
}

/// Wrapper for boxed Notifier trait object.
pub type NotifierService = Arc<dyn Notifier>;

/// Send `event` if a notifier is configured, logging failures.
pub(crate) async fn dispatch(notifier: Option<&NotifierService>, event: NotificationEvent) {
    let Some(notifier) = notifier else {
        return;
    };
    if let Err(e) = notifier.notify(&event).await {
        tracing::warn!(error = %e, kind = event.kind(), "Failed to deliver notification");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every event; optionally fails each delivery.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub events: Mutex<Vec<NotificationEvent>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            Self {
                events: Mutex::default(),
                fail: true,
            }
        }

        #[allow(clippy::unwrap_used)]
        pub fn events(&self) -> Vec<NotificationEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        #[allow(clippy::unwrap_used)]
        async fn notify(&self, event: &NotificationEvent) -> AppResult<()> {
            self.events.lock().unwrap().push(event.clone());
            if self.fail {
                return Err(denuncia_common::AppError::Notification(
                    "smtp unavailable".to_string(),
                ));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingNotifier;
    use super::*;

    #[tokio::test]
    async fn test_dispatch_swallows_failures() {
        let recorder = Arc::new(RecordingNotifier::failing());
        let notifier: NotifierService = recorder.clone();

        dispatch(
            Some(&notifier),
            NotificationEvent::SearchIdIssued {
                complaint_id: "x1".to_string(),
                search_id: "aB3dE".to_string(),
                publisher_id: "r1".to_string(),
            },
        )
        .await;

        assert_eq!(recorder.events().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_without_notifier() {
        dispatch(
            None,
            NotificationEvent::AgencyCommented {
                complaint_id: "x1".to_string(),
                publisher_id: "r1".to_string(),
                agency_id: "a1".to_string(),
                comment_id: "c1".to_string(),
            },
        )
        .await;
    }
}
