use std::sync::Arc;

use teloxide::prelude::*;

use intake_core::{
    domain::ChatId,
    form::{start_keyboard, Reply},
    messaging::types::ReplyMarkup,
    texts,
};

use crate::handlers::send_replies;
use crate::router::AppState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
}

impl Command {
    /// `None` for anything that is not one of our commands; such text goes to the form.
    pub fn parse(text: &str) -> Option<Self> {
        let (cmd, _args) = parse_command(text);
        match cmd.as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn command_reply(cmd: Command) -> Reply {
    match cmd {
        Command::Start => Reply {
            text: texts::WELCOME.to_string(),
            markup: start_keyboard(),
        },
        Command::Help => Reply {
            text: texts::HELP.to_string(),
            markup: ReplyMarkup::None,
        },
    }
}

pub async fn handle_command(
    cmd: Command,
    chat_id: ChatId,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    tracing::debug!(chat_id = chat_id.0, ?cmd, "command");
    send_replies(&state, chat_id, vec![command_reply(cmd)]).await;
    Ok(())
}
