use crate::domain::{ChatId, MessageId, UserId};

/// A slash command received from a messenger.
///
/// Telegram-specific fields live in the Telegram adapter.
#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    /// `None` for messages without a sender (channel posts).
    pub user_id: Option<UserId>,
    /// Lowercased command name without the leading `/` or `@botname` suffix.
    pub name: String,
    /// Everything after the command name, leading whitespace removed.
    pub args: String,
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
}
