//! Outbound delivery boundary.
//!
//! Everything the engine sends goes through [`Notifier`], so tests can
//! swap in a recording double and the broadcast sweep can share the
//! photo/caption fallback logic. Delivery failures are visible but
//! never fatal to the polling loop.

pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use teloxide::types::InlineKeyboardMarkup;

/// Where a message goes: a chat, optionally a forum topic within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub chat_id: i64,
    pub thread_id: Option<i32>,
}

impl Destination {
    pub fn with_thread(chat_id: i64, thread_id: Option<i32>) -> Self {
        Self { chat_id, thread_id }
    }
}

impl From<i64> for Destination {
    fn from(chat_id: i64) -> Self {
        Self {
            chat_id,
            thread_id: None,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(
        &self,
        dest: Destination,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()>;

    /// Deliver a photo with caption. Overlong captions are split into
    /// photo + follow-up text; a photo-level failure falls back to
    /// text-only delivery.
    async fn send_photo(
        &self,
        dest: Destination,
        photo: &str,
        caption: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()>;

    /// Typing indicator, best-effort.
    async fn send_typing(&self, chat_id: i64);

    /// Emoji reaction on a message, best-effort.
    async fn react(&self, chat_id: i64, message_id: i32, emoji: &str);

    /// Acknowledge an inline-button press (stops the client spinner),
    /// best-effort.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>);
}
