use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::types::MessagingCapabilities,
    Result,
};

/// Cross-messenger port.
///
/// Replies are plain text: tracker content (subjects, notes, raw error bodies)
/// is echoed verbatim and must not be interpreted as markup.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;
}
