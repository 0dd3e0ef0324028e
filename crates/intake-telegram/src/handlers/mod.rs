//! Telegram update handlers.
//!
//! `/start` and `/help` are answered directly; every other text message is fed
//! into the form for its chat.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use intake_core::{
    domain::ChatId,
    form::Reply,
    messaging::types::Recipient,
};

use crate::router::AppState;

mod commands;
mod text;

/// Where one inbound text goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Route {
    Command(commands::Command),
    Form,
}

/// Only `/start` and `/help` are commands; any other text, slash-prefixed or not, is form input.
pub(crate) fn route(text: &str) -> Route {
    if text.starts_with('/') {
        if let Some(cmd) = commands::Command::parse(text) {
            return Route::Command(cmd);
        }
    }
    Route::Form
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    dispatch(ChatId(msg.chat.id.0), text, state).await
}

async fn dispatch(chat_id: ChatId, text: &str, state: Arc<AppState>) -> ResponseResult<()> {
    match route(text) {
        Route::Command(cmd) => commands::handle_command(cmd, chat_id, state).await,
        Route::Form => text::handle_text(chat_id, text, state).await,
    }
}

/// Send replies in order. Delivery failures are logged, never surfaced.
pub(crate) async fn send_replies(state: &AppState, chat_id: ChatId, replies: Vec<Reply>) {
    let to = Recipient::from(chat_id);
    for reply in replies {
        if let Err(e) = state
            .messenger
            .send_text(&to, &reply.text, reply.markup)
            .await
        {
            tracing::warn!(chat_id = chat_id.0, error = %e, "failed to send reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use intake_core::{
        domain::{MessageId, MessageRef},
        form::{FormService, FormState},
        messaging::{port::MessagingPort, types::ReplyMarkup},
        store::SqliteStore,
        submit::Submitter,
        texts, Result,
    };
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessagingPort for RecordingMessenger {
        async fn send_text(
            &self,
            _to: &Recipient,
            text: &str,
            _markup: ReplyMarkup,
        ) -> Result<MessageRef> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(text.to_string());
            Ok(MessageRef {
                chat_id: ChatId(0),
                message_id: MessageId(sent.len() as i32),
            })
        }
    }

    struct Harness {
        state: Arc<AppState>,
        messenger: Arc<RecordingMessenger>,
        store: SqliteStore,
    }

    impl Harness {
        fn new() -> Self {
            let store = SqliteStore::open_in_memory().unwrap();
            let messenger = Arc::new(RecordingMessenger::default());
            let form = FormService::new(Submitter::new(Arc::new(store.clone()), None));
            let state = Arc::new(AppState {
                form: Arc::new(form),
                messenger: messenger.clone(),
            });
            Self {
                state,
                messenger,
                store,
            }
        }

        async fn send(&self, chat: ChatId, text: &str) {
            dispatch(chat, text, Arc::clone(&self.state)).await.unwrap();
        }

        fn last_sent(&self) -> Option<String> {
            self.messenger.sent.lock().unwrap().last().cloned()
        }
    }

    #[test]
    fn only_known_commands_leave_the_form() {
        assert_eq!(route("/start"), Route::Command(commands::Command::Start));
        assert_eq!(
            route("/help@consult_bot"),
            Route::Command(commands::Command::Help)
        );
        assert_eq!(route("/foo"), Route::Form);
        assert_eq!(route("Alice"), Route::Form);
        assert_eq!(route(texts::START_FORM_BUTTON), Route::Form);
    }

    #[tokio::test]
    async fn start_command_mid_form_keeps_progress() {
        let h = Harness::new();
        let chat = ChatId(42);

        h.send(chat, texts::START_FORM_BUTTON).await;
        h.send(chat, "Alice").await;
        assert_eq!(h.state.form.state_of(chat).await, FormState::AwaitingPhone);

        h.send(chat, "/start").await;
        assert_eq!(h.last_sent().as_deref(), Some(texts::WELCOME));
        assert_eq!(h.state.form.state_of(chat).await, FormState::AwaitingPhone);

        h.send(chat, "+1000").await;
        assert_eq!(h.state.form.state_of(chat).await, FormState::AwaitingTopic);
    }

    #[tokio::test]
    async fn unknown_command_is_stored_as_form_input() {
        let h = Harness::new();
        let chat = ChatId(42);

        h.send(chat, texts::START_FORM_BUTTON).await;
        h.send(chat, "/foo").await;
        assert_eq!(h.state.form.state_of(chat).await, FormState::AwaitingPhone);
        assert_eq!(h.last_sent().as_deref(), Some(texts::ASK_PHONE));

        for text in ["+1000", "Billing", texts::CONFIRM_BUTTON] {
            h.send(chat, text).await;
        }
        let rows = h.store.recent(1).unwrap();
        assert_eq!(rows[0].name, "/foo");
    }

    #[tokio::test]
    async fn unknown_command_while_idle_gets_no_reply() {
        let h = Harness::new();

        h.send(ChatId(42), "/foo").await;
        h.send(ChatId(42), "   ").await;
        assert!(h.messenger.sent.lock().unwrap().is_empty());
        assert_eq!(h.state.form.state_of(ChatId(42)).await, FormState::Idle);
    }
}
