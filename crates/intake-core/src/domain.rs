use std::fmt;

/// Telegram chat id (numeric). Doubles as the conversation identity for the form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Opaque key of one remote user's dialogue.
pub type ConversationId = ChatId;

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Recipient of submission summaries, as written in `ADMIN_IDS`.
///
/// Kept as the raw string; the messenger adapter decides how to address it
/// (numeric chat id or `@channel` username).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NotificationTarget(pub String);

impl fmt::Display for NotificationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
