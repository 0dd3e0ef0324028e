//! Startup summary of the bots and admins in play.
//!
//! Purely informational: every lookup failure degrades to a placeholder name.

use teloxide::prelude::*;

use intake_core::{
    config::bot_id_from_token, domain::NotificationTarget, messaging::types::Recipient,
};

use crate::TelegramMessenger;

const UNKNOWN_NAME: &str = "[не удалось получить имя]";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotIdentity {
    /// Numeric id taken from the token.
    pub id: String,
    pub username: Option<String>,
    /// `Full Name (@username)` when resolved.
    pub display_name: Option<String>,
}

impl BotIdentity {
    /// How the bot is referenced in admin notifications.
    pub fn entry_point(&self) -> String {
        self.username.clone().unwrap_or_else(|| self.id.clone())
    }

    fn unresolved(token: &str) -> Self {
        Self {
            id: bot_id_from_token(token).unwrap_or_default().to_string(),
            username: None,
            display_name: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AdminIdentity {
    pub target: NotificationTarget,
    pub display_name: String,
}

pub fn display_name(full_name: &str, username: Option<&str>) -> String {
    match username {
        Some(u) if !u.is_empty() => format!("{full_name} (@{u})"),
        _ => full_name.to_string(),
    }
}

pub async fn describe_bot(bot: &Bot, token: &str) -> BotIdentity {
    let mut identity = BotIdentity::unresolved(token);
    match bot.get_me().await {
        Ok(me) => {
            let username = me.user.username.clone();
            identity.display_name = Some(display_name(&me.user.full_name(), username.as_deref()));
            identity.username = username;
        }
        Err(e) => {
            tracing::warn!(bot_id = %identity.id, error = %e, "could not resolve bot name");
        }
    }
    identity
}

/// Resolve the notification bot, reusing the primary bot's details when both
/// tokens belong to the same bot.
pub async fn describe_notification_bot(
    bot: &Bot,
    token: &str,
    primary: &BotIdentity,
) -> BotIdentity {
    if let Some(same) = reuse_identity(primary, token) {
        return same;
    }
    describe_bot(bot, token).await
}

fn reuse_identity(primary: &BotIdentity, token: &str) -> Option<BotIdentity> {
    let id = bot_id_from_token(token)?;
    if id == primary.id && primary.display_name.is_some() {
        Some(primary.clone())
    } else {
        None
    }
}

/// Look up admin display names through the primary bot.
pub async fn describe_admins(bot: &Bot, admins: &[NotificationTarget]) -> Vec<AdminIdentity> {
    let mut out = Vec::with_capacity(admins.len());
    for target in admins {
        let recipient = TelegramMessenger::tg_recipient(&Recipient::from(target));
        let display = match bot.get_chat(recipient).await {
            Ok(chat) => {
                let full = match (chat.title(), chat.first_name(), chat.last_name()) {
                    (Some(title), _, _) => title.to_string(),
                    (None, Some(first), Some(last)) => format!("{first} {last}"),
                    (None, Some(first), None) => first.to_string(),
                    _ => UNKNOWN_NAME.to_string(),
                };
                display_name(&full, chat.username())
            }
            Err(e) => {
                tracing::warn!(%target, error = %e, "could not resolve admin name");
                UNKNOWN_NAME.to_string()
            }
        };
        out.push(AdminIdentity {
            target: target.clone(),
            display_name: display,
        });
    }
    out
}

pub fn log_summary(
    primary: &BotIdentity,
    notification: Option<&BotIdentity>,
    admins: &[AdminIdentity],
) {
    tracing::info!(
        bot_id = %primary.id,
        name = primary.display_name.as_deref().unwrap_or(UNKNOWN_NAME),
        "primary bot"
    );
    match notification {
        Some(n) => tracing::info!(
            bot_id = %n.id,
            name = n.display_name.as_deref().unwrap_or(UNKNOWN_NAME),
            "notification bot"
        ),
        None => tracing::info!("notification bot token not set"),
    }
    if admins.is_empty() {
        tracing::info!("no admin ids configured");
    }
    for admin in admins {
        tracing::info!(id = %admin.target, name = %admin.display_name, "admin");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary() -> BotIdentity {
        BotIdentity {
            id: "111".to_string(),
            username: Some("consult_bot".to_string()),
            display_name: Some("Consult (@consult_bot)".to_string()),
        }
    }

    #[test]
    fn display_name_appends_username() {
        assert_eq!(display_name("Anna K", Some("anna")), "Anna K (@anna)");
        assert_eq!(display_name("Anna K", None), "Anna K");
    }

    #[test]
    fn entry_point_falls_back_to_id() {
        assert_eq!(primary().entry_point(), "consult_bot");
        assert_eq!(BotIdentity::unresolved("222:secret").entry_point(), "222");
    }

    #[test]
    fn same_bot_token_reuses_primary_details() {
        assert_eq!(reuse_identity(&primary(), "111:other"), Some(primary()));
        assert_eq!(reuse_identity(&primary(), "222:other"), None);

        let unresolved = BotIdentity::unresolved("111:x");
        assert_eq!(reuse_identity(&unresolved, "111:other"), None);
    }
}
