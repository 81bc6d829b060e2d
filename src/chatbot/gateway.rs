//! Capability seam to the messaging platform.

use async_trait::async_trait;

use crate::chatbot::message::Attachment;

/// Outbound side of the chat platform, injected into the engine.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a plain text reply.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), String>;

    /// Send a rich attachment.
    async fn send_attachment(&self, chat_id: i64, attachment: &Attachment) -> Result<(), String>;

    /// Resolve a user's display name. `Ok(None)` when the platform knows no name.
    async fn display_name(&self, chat_id: i64, user_id: i64) -> Result<Option<String>, String>;
}
