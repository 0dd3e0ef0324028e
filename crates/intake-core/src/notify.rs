use std::{sync::Arc, time::Duration};

use tokio::task::JoinSet;
use tokio::time::timeout;

use crate::{
    domain::NotificationTarget,
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{Recipient, ReplyMarkup},
    },
    store::Application,
    texts,
};

/// Outcome of one fan-out. Informational only; it never affects the submission result.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: Vec<NotificationTarget>,
}

/// Best-effort relay of new applications through the secondary bot identity.
pub struct Notifier {
    messenger: Arc<dyn MessagingPort>,
    targets: Vec<NotificationTarget>,
    entry_point: String,
    send_timeout: Duration,
}

impl Notifier {
    pub fn new(
        messenger: Arc<dyn MessagingPort>,
        targets: Vec<NotificationTarget>,
        entry_point: impl Into<String>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            messenger,
            targets,
            entry_point: entry_point.into(),
            send_timeout,
        }
    }

    pub fn has_targets(&self) -> bool {
        !self.targets.is_empty()
    }

    /// Send the summary to every target concurrently.
    ///
    /// Each send is bounded by `send_timeout`; a failing or hanging recipient is
    /// logged and skipped without holding up the others.
    pub async fn notify(&self, app: &Application) -> DeliveryReport {
        let text: Arc<str> = texts::admin_notification(&self.entry_point, app).into();
        let mut sends = JoinSet::new();

        for target in &self.targets {
            let messenger = Arc::clone(&self.messenger);
            let text = Arc::clone(&text);
            let target = target.clone();
            let limit = self.send_timeout;
            sends.spawn(async move {
                let to = Recipient::from(&target);
                let res = match timeout(limit, messenger.send_text(&to, &text, ReplyMarkup::None))
                    .await
                {
                    Ok(Ok(_)) => Ok(()),
                    Ok(Err(e)) => Err(e),
                    Err(_) => Err(Error::External(format!(
                        "send timed out after {}ms",
                        limit.as_millis()
                    ))),
                };
                (target, res)
            });
        }

        let mut report = DeliveryReport::default();
        while let Some(joined) = sends.join_next().await {
            match joined {
                Ok((target, Ok(()))) => {
                    tracing::info!(application_id = app.id, %target, "notification sent");
                    report.delivered += 1;
                }
                Ok((target, Err(e))) => {
                    tracing::error!(application_id = app.id, %target, error = %e, "notification failed");
                    report.failed.push(target);
                }
                Err(e) => {
                    tracing::error!(application_id = app.id, error = %e, "notification task panicked");
                }
            }
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::{ChatId, MessageId, MessageRef};
    use crate::Result;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Records every send; recipients listed in `fail`/`hang` misbehave.
    #[derive(Default)]
    pub(crate) struct FakeMessenger {
        pub sends: Mutex<Vec<(Recipient, String, ReplyMarkup)>>,
        pub fail: Vec<Recipient>,
        pub hang: Vec<Recipient>,
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_text(
            &self,
            to: &Recipient,
            text: &str,
            markup: ReplyMarkup,
        ) -> Result<MessageRef> {
            if self.hang.contains(to) {
                std::future::pending::<()>().await;
            }
            if self.fail.contains(to) {
                return Err(Error::External("chat not found".to_string()));
            }
            let mut sends = self.sends.lock().unwrap();
            sends.push((to.clone(), text.to_string(), markup));
            Ok(MessageRef {
                chat_id: ChatId(0),
                message_id: MessageId(sends.len() as i32),
            })
        }
    }

    fn app() -> Application {
        Application {
            id: 7,
            name: "Alice".to_string(),
            phone: "+1000".to_string(),
            topic: "Billing".to_string(),
            submitted_at: NaiveDate::from_ymd_opt(2026, 1, 2)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
        }
    }

    fn targets(ids: &[&str]) -> Vec<NotificationTarget> {
        ids.iter().map(|s| NotificationTarget(s.to_string())).collect()
    }

    #[tokio::test]
    async fn sends_summary_to_every_target() {
        let api = Arc::new(FakeMessenger::default());
        let notifier = Notifier::new(
            api.clone(),
            targets(&["1", "2"]),
            "consult_bot",
            Duration::from_secs(1),
        );

        let report = notifier.notify(&app()).await;
        assert_eq!(report.delivered, 2);
        assert!(report.failed.is_empty());

        let sends = api.sends.lock().unwrap();
        assert_eq!(sends.len(), 2);
        let text = &sends[0].1;
        assert!(text.contains("через @consult_bot"));
        assert!(text.contains("Имя: Alice"));
        assert!(text.contains("Телефон: +1000"));
        assert!(text.contains("Тема: Billing"));
    }

    #[tokio::test]
    async fn failing_target_does_not_block_others() {
        let api = Arc::new(FakeMessenger {
            fail: vec![Recipient::Chat(ChatId(2))],
            ..Default::default()
        });
        let notifier = Notifier::new(
            api.clone(),
            targets(&["1", "2", "3"]),
            "consult_bot",
            Duration::from_secs(1),
        );

        let report = notifier.notify(&app()).await;
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, targets(&["2"]));
        assert_eq!(api.sends.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_target_is_cut_off_by_timeout() {
        let api = Arc::new(FakeMessenger {
            hang: vec![Recipient::Chat(ChatId(1))],
            ..Default::default()
        });
        let notifier = Notifier::new(
            api.clone(),
            targets(&["1", "2"]),
            "consult_bot",
            Duration::from_millis(200),
        );

        let report = notifier.notify(&app()).await;
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, targets(&["1"]));
    }
}
