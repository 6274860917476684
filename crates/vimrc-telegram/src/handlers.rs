//! Message handlers for the session room.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, error, info};
use vimrc_models::ChatMessage;

use crate::command::ChatCommand;
use crate::messages;
use crate::state::BotState;

/// Name a sender is counted under: the username, else the display name.
pub fn sender_name(username: Option<&str>, full_name: &str) -> String {
    match username.filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => full_name.trim().to_string(),
    }
}

async fn reply_html(bot: &Bot, msg: &Message, text: String) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Handle a text message: run bot commands, count everything else and
/// answer line references.
pub async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !state.accepts_chat(msg.chat.id.0) {
        debug!(chat_id = %msg.chat.id, "message from another chat ignored");
        return Ok(());
    }

    let user = msg
        .from
        .as_ref()
        .map(|u| sender_name(u.username.as_deref(), &u.full_name()))
        .unwrap_or_default();

    if ChatCommand::is_command(text) {
        let Some(command) = ChatCommand::parse(text) else {
            return Ok(());
        };
        let log_url = msg.url().map(|url| url.to_string()).unwrap_or_default();
        info!(chat_id = %msg.chat.id, user = %user, command = ?command, "command received");

        match state.execute(command, &user, &log_url).await {
            Ok(replies) => {
                for reply in replies {
                    reply_html(&bot, &msg, reply).await?;
                }
            }
            Err(e) => {
                error!(chat_id = %msg.chat.id, error = %e, "command failed");
                reply_html(&bot, &msg, messages::error(&e)).await?;
            }
        }
        return Ok(());
    }

    let mut message = ChatMessage::new(&user, text).with_id(msg.id.0.to_string());
    message.timestamp = msg.date;
    state.record_message(message).await;

    if let Some(reply) = state.quote(text, &user).await {
        debug!(chat_id = %msg.chat.id, user = %user, "quoting lines");
        reply_html(&bot, &msg, reply).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_name() {
        assert_eq!(sender_name(Some("alice"), "Alice Liddell"), "alice");
        assert_eq!(sender_name(Some(""), "Alice Liddell"), "Alice Liddell");
        assert_eq!(sender_name(None, " Bob "), "Bob");
    }
}
