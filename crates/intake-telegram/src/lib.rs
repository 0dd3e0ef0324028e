//! Telegram adapter (teloxide).
//!
//! This crate implements the `intake-core` MessagingPort over Telegram Bot API
//! and routes incoming updates into the form.

use std::borrow::Cow;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, KeyboardRemove},
};

pub mod handlers;
pub mod identity;
pub mod router;

use intake_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{Recipient, ReplyMarkup},
    },
    Result,
};

/// Bot API limit for one message, in UTF-16 code units.
const MAX_MESSAGE_LEN: usize = 4096;

/// Clip `text` to what Telegram accepts, marking the cut with an ellipsis.
fn fit_message(text: &str) -> Cow<'_, str> {
    if text.encode_utf16().count() <= MAX_MESSAGE_LEN {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut used = 0;
    for ch in text.chars() {
        used += ch.len_utf16();
        if used > MAX_MESSAGE_LEN - 1 {
            break;
        }
        out.push(ch);
    }
    out.push('…');
    Cow::Owned(out)
}

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_recipient(to: &Recipient) -> teloxide::types::Recipient {
        match to {
            Recipient::Chat(chat_id) => {
                teloxide::types::Recipient::Id(teloxide::types::ChatId(chat_id.0))
            }
            Recipient::Username(name) => teloxide::types::Recipient::ChannelUsername(name.clone()),
        }
    }

    fn tg_markup(markup: ReplyMarkup) -> Option<teloxide::types::ReplyMarkup> {
        match markup {
            ReplyMarkup::None => None,
            ReplyMarkup::Remove => Some(teloxide::types::ReplyMarkup::KeyboardRemove(
                KeyboardRemove::new(),
            )),
            ReplyMarkup::Keyboard(kb) => {
                let rows: Vec<Vec<KeyboardButton>> = kb
                    .rows
                    .into_iter()
                    .map(|row| row.into_iter().map(KeyboardButton::new).collect())
                    .collect();
                Some(teloxide::types::ReplyMarkup::Keyboard(
                    KeyboardMarkup::new(rows)
                        .resize_keyboard(true)
                        .one_time_keyboard(kb.one_time),
                ))
            }
        }
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_text(
        &self,
        to: &Recipient,
        text: &str,
        markup: ReplyMarkup,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_message(Self::tg_recipient(to), fit_message(text).into_owned());
        if let Some(markup) = Self::tg_markup(markup) {
            req = req.reply_markup(markup);
        }
        let msg = req.await.map_err(Self::map_err)?;

        Ok(MessageRef {
            chat_id: ChatId(msg.chat.id.0),
            message_id: MessageId(msg.id.0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::messaging::types::ReplyKeyboard;

    #[test]
    fn maps_recipients() {
        assert_eq!(
            TelegramMessenger::tg_recipient(&Recipient::Chat(ChatId(-100))),
            teloxide::types::Recipient::Id(teloxide::types::ChatId(-100))
        );
        assert_eq!(
            TelegramMessenger::tg_recipient(&Recipient::Username("@ops".to_string())),
            teloxide::types::Recipient::ChannelUsername("@ops".to_string())
        );
    }

    #[test]
    fn keyboard_becomes_reply_keyboard() {
        let kb = ReplyKeyboard::single_row(&["Да, отправить", "Нет, начать заново"], true);
        let Some(teloxide::types::ReplyMarkup::Keyboard(markup)) =
            TelegramMessenger::tg_markup(ReplyMarkup::Keyboard(kb))
        else {
            panic!("expected reply keyboard");
        };
        assert_eq!(markup.keyboard.len(), 1);
        assert_eq!(markup.keyboard[0].len(), 2);
        assert_eq!(markup.keyboard[0][1].text, "Нет, начать заново");

        assert!(TelegramMessenger::tg_markup(ReplyMarkup::None).is_none());
        assert!(matches!(
            TelegramMessenger::tg_markup(ReplyMarkup::Remove),
            Some(teloxide::types::ReplyMarkup::KeyboardRemove(_))
        ));
    }

    #[test]
    fn oversized_text_is_clipped_to_the_api_limit() {
        assert!(matches!(fit_message("short"), Cow::Borrowed("short")));

        let exact = "я".repeat(MAX_MESSAGE_LEN);
        assert!(matches!(fit_message(&exact), Cow::Borrowed(_)));

        let long = "я".repeat(MAX_MESSAGE_LEN * 3);
        let fitted = fit_message(&long);
        assert_eq!(fitted.encode_utf16().count(), MAX_MESSAGE_LEN);
        assert!(fitted.ends_with('…'));

        // Astral characters take two UTF-16 units and must not be split.
        let emoji = "😀".repeat(MAX_MESSAGE_LEN);
        let fitted = fit_message(&emoji);
        assert!(fitted.encode_utf16().count() <= MAX_MESSAGE_LEN);
        assert!(fitted.ends_with('…'));
    }
}
