//! Conversation state machine for the consultation form.
//!
//! `Idle → AwaitingName → AwaitingPhone → AwaitingTopic → AwaitingConfirmation → Idle`,
//! with the start phrase restarting from any state and "restart" looping
//! `AwaitingConfirmation` back to `AwaitingName`.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    domain::ConversationId,
    messaging::types::{ReplyKeyboard, ReplyMarkup},
    submit::{SubmissionResult, Submitter},
    texts,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FormState {
    #[default]
    Idle,
    AwaitingName,
    AwaitingPhone,
    AwaitingTopic,
    AwaitingConfirmation,
}

/// Fields collected so far. Only complete once `AwaitingConfirmation` is reached.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormData {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub topic: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationSession {
    pub state: FormState,
    pub data: FormData,
}

impl ConversationSession {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn restart(&mut self) {
        self.data = FormData::default();
        self.state = FormState::AwaitingName;
    }
}

// Normalized (trimmed, lowercased) trigger phrases.
const START_FORM_PHRASE: &str = "оставить заявку";
const CONFIRM_PHRASE: &str = "да, отправить";
const RESTART_PHRASE: &str = "нет, начать заново";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    StartForm,
    Confirm,
    Restart,
}

impl Trigger {
    const ALL: [(Trigger, &'static str); 3] = [
        (Trigger::StartForm, START_FORM_PHRASE),
        (Trigger::Confirm, CONFIRM_PHRASE),
        (Trigger::Restart, RESTART_PHRASE),
    ];

    pub fn parse(text: &str) -> Option<Self> {
        let normalized = normalize(text);
        Self::ALL
            .iter()
            .find(|(_, phrase)| *phrase == normalized)
            .map(|(trigger, _)| *trigger)
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// One outgoing message produced by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub markup: ReplyMarkup,
}

impl Reply {
    fn new(text: impl Into<String>, markup: ReplyMarkup) -> Self {
        Self {
            text: text.into(),
            markup,
        }
    }
}

/// Keyboard offering the start button (after `/start` and after each submission).
pub fn start_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(ReplyKeyboard::single_row(&[texts::START_FORM_BUTTON], false))
}

fn confirm_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(ReplyKeyboard::single_row(
        &[texts::CONFIRM_BUTTON, texts::RESTART_BUTTON],
        true,
    ))
}

/// Result of applying one inbound text to a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Reply(Vec<Reply>),
    /// The user confirmed; the session is already reset and these fields must be submitted.
    Submit(FormData),
}

/// Apply one inbound text. Pure apart from mutating `session`.
pub fn transition(session: &mut ConversationSession, text: &str) -> Step {
    let trigger = Trigger::parse(text);

    if trigger == Some(Trigger::StartForm) {
        session.restart();
        return Step::Reply(vec![Reply::new(texts::ASK_NAME, ReplyMarkup::Remove)]);
    }

    match session.state {
        FormState::Idle => Step::Reply(Vec::new()),
        FormState::AwaitingName => {
            session.data.name = Some(text.to_string());
            session.state = FormState::AwaitingPhone;
            Step::Reply(vec![Reply::new(texts::ASK_PHONE, ReplyMarkup::None)])
        }
        FormState::AwaitingPhone => {
            session.data.phone = Some(text.to_string());
            session.state = FormState::AwaitingTopic;
            Step::Reply(vec![Reply::new(texts::ASK_TOPIC, ReplyMarkup::None)])
        }
        FormState::AwaitingTopic => {
            session.data.topic = Some(text.to_string());
            session.state = FormState::AwaitingConfirmation;
            let FormData { name, phone, topic } = &session.data;
            let summary = texts::confirmation_summary(
                name.as_deref().unwrap_or_default(),
                phone.as_deref().unwrap_or_default(),
                topic.as_deref().unwrap_or_default(),
            );
            Step::Reply(vec![Reply::new(summary, confirm_keyboard())])
        }
        FormState::AwaitingConfirmation => match trigger {
            Some(Trigger::Confirm) => {
                let data = std::mem::take(&mut session.data);
                session.reset();
                Step::Submit(data)
            }
            Some(Trigger::Restart) => {
                session.restart();
                Step::Reply(vec![Reply::new(texts::RESTARTED, ReplyMarkup::Remove)])
            }
            _ => Step::Reply(vec![Reply::new(texts::USE_BUTTONS, confirm_keyboard())]),
        },
    }
}

/// Owns every conversation's session and runs transitions one at a time per conversation.
pub struct FormService {
    sessions: Mutex<HashMap<ConversationId, Arc<Mutex<ConversationSession>>>>,
    submitter: Submitter,
}

impl FormService {
    pub fn new(submitter: Submitter) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            submitter,
        }
    }

    /// The conversation's session, creating one only when `text` opens the form.
    /// Chatter from idle conversations never allocates.
    async fn session_for(
        &self,
        conversation: ConversationId,
        text: &str,
    ) -> Option<Arc<Mutex<ConversationSession>>> {
        let mut map = self.sessions.lock().await;
        if let Some(existing) = map.get(&conversation) {
            return Some(Arc::clone(existing));
        }
        if Trigger::parse(text) != Some(Trigger::StartForm) {
            return None;
        }
        Some(Arc::clone(map.entry(conversation).or_default()))
    }

    /// Drop the entry once the session is blank and idle and no other step holds it.
    async fn evict_if_idle(
        &self,
        conversation: ConversationId,
        session: Arc<Mutex<ConversationSession>>,
    ) {
        let mut map = self.sessions.lock().await;
        let ours = map
            .get(&conversation)
            .is_some_and(|current| Arc::ptr_eq(current, &session));
        // One reference in the map, one here: nobody else is queued on it.
        if !ours || Arc::strong_count(&session) != 2 {
            return;
        }
        let idle = session
            .try_lock()
            .is_ok_and(|s| *s == ConversationSession::default());
        if idle {
            map.remove(&conversation);
            tracing::debug!(
                conversation = conversation.0,
                active = map.len(),
                "session closed"
            );
        }
    }

    /// Conversations without a session are idle.
    pub async fn state_of(&self, conversation: ConversationId) -> FormState {
        let session = self.sessions.lock().await.get(&conversation).cloned();
        match session {
            Some(session) => session.lock().await.state,
            None => FormState::Idle,
        }
    }

    #[cfg(test)]
    async fn active_sessions(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Feed one inbound text and return the replies to send back, in order.
    ///
    /// The conversation's session stays locked for the whole step, storage included.
    /// The admin fan-out runs in the background and is not awaited.
    pub async fn handle_text(&self, conversation: ConversationId, text: &str) -> Vec<Reply> {
        let Some(session) = self.session_for(conversation, text).await else {
            return Vec::new();
        };

        let replies = {
            let mut guard = session.lock().await;
            self.step(conversation, &mut guard, text).await
        };

        self.evict_if_idle(conversation, session).await;
        replies
    }

    async fn step(
        &self,
        conversation: ConversationId,
        session: &mut ConversationSession,
        text: &str,
    ) -> Vec<Reply> {
        let before = session.state;
        let step = transition(session, text);
        tracing::debug!(
            conversation = conversation.0,
            from = ?before,
            to = ?session.state,
            "form transition"
        );

        match step {
            Step::Reply(replies) => replies,
            Step::Submit(data) => {
                let outcome = match self.submitter.submit(&data).await.result {
                    SubmissionResult::Success(_) => texts::SUBMITTED,
                    SubmissionResult::Failure => texts::SUBMIT_FAILED,
                };
                vec![
                    Reply::new(outcome, ReplyMarkup::Remove),
                    Reply::new(texts::ANOTHER_ONE, start_keyboard()),
                ]
            }
        }
    }
}
