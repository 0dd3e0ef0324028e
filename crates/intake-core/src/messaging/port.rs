use async_trait::async_trait;

use crate::{
    domain::MessageRef,
    messaging::types::{Recipient, ReplyMarkup},
    Result,
};

/// Cross-messenger port.
///
/// The form core only needs "send text to someone"; both the user-facing bot and
/// the notification bot are driven through this trait.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(
        &self,
        to: &Recipient,
        text: &str,
        markup: ReplyMarkup,
    ) -> Result<MessageRef>;
}
