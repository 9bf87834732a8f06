//! Telegram update handlers.
//!
//! Plain text is ignored; slash commands are turned into a core `Command`,
//! dispatched, and the reply is sent back as a reply to the original message.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};
use tracing::warn;

use rtb_core::{
    commands::parse_command,
    domain::{ChatId, MessageId, UserId},
    formatting::split_message,
    messaging::types::Command,
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(cmd) = command_from_message(&msg, state.bot_username.as_deref()) else {
        return Ok(());
    };

    let reply = state.commands.dispatch(&cmd).await;
    send_reply(&state, &cmd, &reply).await;
    Ok(())
}

fn command_from_message(msg: &Message, bot_username: Option<&str>) -> Option<Command> {
    let (name, args) = parse_command(msg.text()?, bot_username)?;

    Some(Command {
        chat_id: ChatId(msg.chat.id.0),
        message_id: MessageId(msg.id.0),
        user_id: msg.from().map(|u| UserId(u.id.0 as i64)),
        name,
        args,
    })
}

/// Send `reply`, split to fit the messenger limit. Only the first chunk
/// is threaded under the user's message. Send failures are logged and dropped.
async fn send_reply(state: &AppState, cmd: &Command, reply: &str) {
    let limit = state
        .cfg
        .telegram_safe_limit
        .min(state.messenger.capabilities().max_message_len);

    for (i, chunk) in split_message(reply, limit).iter().enumerate() {
        let reply_to = (i == 0).then_some(cmd.message_id);
        if let Err(e) = state
            .messenger
            .send_text(cmd.chat_id, chunk, reply_to)
            .await
        {
            warn!(chat = cmd.chat_id.0, command = %cmd.name, error = %e, "failed to send reply");
            return;
        }
    }
}
