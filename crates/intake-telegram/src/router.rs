use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use intake_core::{
    config::Config, form::FormService, messaging::port::MessagingPort, notify::Notifier,
    store::ApplicationStore, submit::Submitter,
};

use crate::handlers;
use crate::identity;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub form: Arc<FormService>,
    pub messenger: Arc<dyn MessagingPort>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    store: Arc<dyn ApplicationStore>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.user_facing_bot_token.clone());

    let primary = identity::describe_bot(&bot, &cfg.user_facing_bot_token).await;

    let notifier = match &cfg.notification_bot_token {
        Some(token) => {
            let notif_bot = Bot::new(token.clone());
            let described =
                identity::describe_notification_bot(&notif_bot, token, &primary).await;
            let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(notif_bot));
            Some((
                described,
                Notifier::new(
                    messenger,
                    cfg.admin_ids.clone(),
                    primary.entry_point(),
                    cfg.notify_timeout,
                ),
            ))
        }
        None => None,
    };

    let admins = identity::describe_admins(&bot, &cfg.admin_ids).await;
    identity::log_summary(
        &primary,
        notifier.as_ref().map(|(described, _)| described),
        &admins,
    );

    let submitter = Submitter::new(store, notifier.map(|(_, n)| n));
    let state = Arc::new(AppState {
        form: Arc::new(FormService::new(submitter)),
        messenger: Arc::new(TelegramMessenger::new(bot.clone())),
    });

    tracing::info!("bot is starting");

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    tracing::info!("bot stopped");
    Ok(())
}
