//! Telegram client using teloxide.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use tracing::info;

use crate::chatbot::gateway::MessagingGateway;
use crate::chatbot::message::Attachment;

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    async fn send_html(&self, chat_id: i64, html: &str) -> Result<(), String> {
        self.bot
            .send_message(ChatId(chat_id), html)
            .parse_mode(ParseMode::Html)
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to send: {e}"))
    }
}

#[async_trait]
impl MessagingGateway for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), String> {
        self.bot
            .send_message(ChatId(chat_id), text)
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to send: {e}"))
    }

    /// Photo with an HTML caption when the image URL is usable, HTML text otherwise.
    async fn send_attachment(&self, chat_id: i64, attachment: &Attachment) -> Result<(), String> {
        info!("📷 Sending attachment \"{}\" to chat {}", attachment.title, chat_id);
        let caption = attachment.to_html();

        let image = match reqwest::Url::parse(&attachment.image_url) {
            Ok(url) => url,
            Err(_) => return self.send_html(chat_id, &caption).await,
        };

        let sent = self
            .bot
            .send_photo(ChatId(chat_id), InputFile::url(image))
            .caption(caption.clone())
            .parse_mode(ParseMode::Html)
            .await;

        match sent {
            Ok(_) => Ok(()),
            Err(e) => {
                // Telegram refuses some remote images; the link still gets through.
                info!("Photo rejected, sending attachment as text: {e}");
                self.send_html(chat_id, &caption).await
            }
        }
    }

    async fn display_name(&self, chat_id: i64, user_id: i64) -> Result<Option<String>, String> {
        info!("Getting chat member: chat={}, user={}", chat_id, user_id);

        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), UserId(user_id as u64))
            .await
            .map_err(|e| format!("Failed to get chat member: {e}"))?;

        let user = member.user;
        let name = user.username.unwrap_or(user.first_name);
        Ok(if name.is_empty() { None } else { Some(name) })
    }
}
