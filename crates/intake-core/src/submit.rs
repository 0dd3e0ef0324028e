use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    form::FormData,
    notify::{DeliveryReport, Notifier},
    store::{Application, ApplicationStore, StorageError},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionResult {
    /// The application is durably stored. Notification delivery does not affect this.
    Success(Application),
    Failure,
}

/// What `submit` hands back: the stored outcome, plus the admin fan-out when one was started.
#[derive(Debug)]
pub struct Submission {
    pub result: SubmissionResult,
    /// Runs in the background; callers may await it or drop it.
    pub delivery: Option<JoinHandle<DeliveryReport>>,
}

/// Terminal step of the form: persist, then relay.
pub struct Submitter {
    store: Arc<dyn ApplicationStore>,
    notifier: Option<Arc<Notifier>>,
}

impl Submitter {
    pub fn new(store: Arc<dyn ApplicationStore>, notifier: Option<Notifier>) -> Self {
        Self {
            store,
            notifier: notifier.map(Arc::new),
        }
    }

    /// Persist `data`, then start the admin fan-out without waiting for it.
    pub async fn submit(&self, data: &FormData) -> Submission {
        let app = match self.persist(data).await {
            Ok(app) => app,
            Err(e) => {
                tracing::error!(error = %e, "failed to save application");
                return Submission {
                    result: SubmissionResult::Failure,
                    delivery: None,
                };
            }
        };
        tracing::info!(
            application_id = app.id,
            submitted_at = %app.submitted_at_text(),
            "application saved"
        );

        let delivery = match &self.notifier {
            Some(notifier) if notifier.has_targets() => {
                let notifier = Arc::clone(notifier);
                let app = app.clone();
                Some(tokio::spawn(async move {
                    let report = notifier.notify(&app).await;
                    if !report.failed.is_empty() {
                        tracing::warn!(
                            application_id = app.id,
                            delivered = report.delivered,
                            failed = report.failed.len(),
                            "some admins were not notified"
                        );
                    }
                    report
                }))
            }
            _ => {
                tracing::warn!(
                    "NOTIFICATION_BOT_TOKEN or ADMIN_IDS not set; admins will not be notified"
                );
                None
            }
        };

        Submission {
            result: SubmissionResult::Success(app),
            delivery,
        }
    }

    async fn persist(&self, data: &FormData) -> Result<Application, StorageError> {
        let store = Arc::clone(&self.store);
        let name = data.name.clone().unwrap_or_default();
        let phone = data.phone.clone().unwrap_or_default();
        let topic = data.topic.clone().unwrap_or_default();

        tokio::task::spawn_blocking(move || store.append(&name, &phone, &topic))
            .await
            .map_err(|e| StorageError::Join(e.to_string()))?
    }
}
