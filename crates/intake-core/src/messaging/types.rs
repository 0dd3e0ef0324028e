use crate::domain::{ChatId, NotificationTarget};

/// Where an outgoing message goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Recipient {
    Chat(ChatId),
    /// Public username such as `@channel`.
    Username(String),
}

impl From<ChatId> for Recipient {
    fn from(chat_id: ChatId) -> Self {
        Self::Chat(chat_id)
    }
}

impl From<&NotificationTarget> for Recipient {
    fn from(target: &NotificationTarget) -> Self {
        let raw = target.0.trim();
        match raw.parse::<i64>() {
            Ok(id) => Self::Chat(ChatId(id)),
            Err(_) if raw.starts_with('@') => Self::Username(raw.to_string()),
            Err(_) => Self::Username(format!("@{raw}")),
        }
    }
}

/// Reply keyboard (quick-reply buttons). Tapping a button just sends its label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    pub one_time: bool,
}

impl ReplyKeyboard {
    /// All buttons on a single row.
    pub fn single_row(labels: &[&str], one_time: bool) -> Self {
        Self {
            rows: vec![labels.iter().map(|l| l.to_string()).collect()],
            one_time,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ReplyMarkup {
    /// Leave whatever keyboard the client currently shows.
    #[default]
    None,
    Keyboard(ReplyKeyboard),
    /// Hide the custom keyboard.
    Remove,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_target_is_chat() {
        let t = NotificationTarget("123456".to_string());
        assert_eq!(Recipient::from(&t), Recipient::Chat(ChatId(123456)));

        let neg = NotificationTarget(" -100200 ".to_string());
        assert_eq!(Recipient::from(&neg), Recipient::Chat(ChatId(-100200)));
    }

    #[test]
    fn non_numeric_target_is_username() {
        let t = NotificationTarget("@ops_channel".to_string());
        assert_eq!(
            Recipient::from(&t),
            Recipient::Username("@ops_channel".to_string())
        );

        let bare = NotificationTarget("ops_channel".to_string());
        assert_eq!(
            Recipient::from(&bare),
            Recipient::Username("@ops_channel".to_string())
        );
    }
}
