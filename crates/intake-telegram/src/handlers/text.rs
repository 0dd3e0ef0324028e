use std::sync::Arc;

use teloxide::prelude::*;

use intake_core::domain::ChatId;

use crate::handlers::send_replies;
use crate::router::AppState;

pub async fn handle_text(chat_id: ChatId, text: &str, state: Arc<AppState>) -> ResponseResult<()> {
    if text.trim().is_empty() {
        return Ok(());
    }

    let replies = state.form.handle_text(chat_id, text).await;
    send_replies(&state, chat_id, replies).await;
    Ok(())
}
