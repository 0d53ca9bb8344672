//! Telegram delivery over the Bot API.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use teloxide::payloads::{AnswerCallbackQuerySetters, SendMessageSetters, SendPhotoSetters};
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, InlineKeyboardMarkup, InputFile, ParseMode};
use tracing::{debug, info, warn};

use super::{Destination, Notifier};
use crate::utils::links::direct_drive_url;

/// Photo captions beyond this are delivered as photo + follow-up text.
pub const PHOTO_CAPTION_LIMIT: usize = 1000;

#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    http: reqwest::Client,
    token: String,
    dry_run: bool,
}

impl TelegramNotifier {
    pub fn new(
        bot: Bot,
        token: &str,
        request_timeout: Duration,
        dry_run: bool,
    ) -> Result<Self> {
        // Own client for the few Bot API methods the teloxide version
        // in use does not expose (setMessageReaction).
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            bot,
            http,
            token: token.to_string(),
            dry_run,
        })
    }

    /// Local paths become uploads, URLs are fetched by Telegram. Drive
    /// viewer links are rewritten to their direct-download form first.
    fn photo_input(&self, source: &str) -> Option<InputFile> {
        let source = source.trim();
        if let Some(path) = source.strip_prefix("file://") {
            return Some(InputFile::file(PathBuf::from(path)));
        }
        if source.starts_with('/') {
            return Some(InputFile::file(PathBuf::from(source)));
        }
        url::Url::parse(&direct_drive_url(source))
            .ok()
            .map(InputFile::url)
    }

    async fn try_send_photo(
        &self,
        dest: Destination,
        file: InputFile,
        caption: Option<&str>,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        let mut request = self.bot.send_photo(ChatId(dest.chat_id), file);
        if let Some(caption) = caption {
            request = request.caption(caption).parse_mode(ParseMode::Html);
        }
        if let Some(thread_id) = dest.thread_id {
            request = request.message_thread_id(thread_id);
        }
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }
        request.await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(
        &self,
        dest: Destination,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        if self.dry_run {
            info!(
                "[DRY_RUN] would send text to chat {} (thread {:?}):\n{text}",
                dest.chat_id, dest.thread_id
            );
            return Ok(());
        }
        let mut request = self
            .bot
            .send_message(ChatId(dest.chat_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(thread_id) = dest.thread_id {
            request = request.message_thread_id(thread_id);
        }
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(keyboard);
        }
        request.await?;
        Ok(())
    }

    async fn send_photo(
        &self,
        dest: Destination,
        photo: &str,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        if self.dry_run {
            info!(
                "[DRY_RUN] would send photo '{photo}' to chat {} (thread {:?}) with caption:\n{caption}",
                dest.chat_id, dest.thread_id
            );
            return Ok(());
        }
        let Some(file) = self.photo_input(photo) else {
            warn!("unusable photo source '{photo}'; sending text only");
            return self.send_text(dest, caption, keyboard).await;
        };

        let caption_fits = caption.chars().count() <= PHOTO_CAPTION_LIMIT;
        let attempt = if caption_fits {
            self.try_send_photo(dest, file, Some(caption), keyboard.clone())
                .await
        } else {
            self.try_send_photo(dest, file, None, None).await
        };

        match attempt {
            Ok(()) if caption_fits => Ok(()),
            // Caption went over the limit: follow up with the text.
            Ok(()) => self.send_text(dest, caption, keyboard).await,
            Err(e) => {
                warn!(
                    "photo delivery to chat {} failed ({e:#}); falling back to text",
                    dest.chat_id
                );
                self.send_text(dest, caption, keyboard).await
            }
        }
    }

    async fn send_typing(&self, chat_id: i64) {
        if self.dry_run {
            return;
        }
        if let Err(e) = self
            .bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
        {
            debug!("typing indicator for chat {chat_id} failed: {e}");
        }
    }

    async fn react(&self, chat_id: i64, message_id: i32, emoji: &str) {
        if self.dry_run {
            info!("[DRY_RUN] would react {emoji} to message {message_id} in chat {chat_id}");
            return;
        }
        let url = format!("https://api.telegram.org/bot{}/setMessageReaction", self.token);
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "reaction": [{"type": "emoji", "emoji": emoji}],
        });
        match self.http.post(&url).json(&payload).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(
                    "setMessageReaction for chat {chat_id} returned {}",
                    response.status()
                );
            }
            Ok(_) => {}
            Err(e) => warn!("setMessageReaction for chat {chat_id} failed: {e}"),
        }
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) {
        if self.dry_run {
            return;
        }
        let mut request = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(text) = text {
            request = request.text(text);
        }
        if let Err(e) = request.await {
            warn!("answer_callback_query {callback_id} failed: {e}");
        }
    }
}
