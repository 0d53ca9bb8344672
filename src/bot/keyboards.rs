//! Inline keyboards attached to quest messages.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Standard keyboard under every delivered quest.
pub fn quest_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "✅ Done (next quest)",
            "next",
        )],
        vec![
            InlineKeyboardButton::callback("📖 Read again", "repeat"),
            InlineKeyboardButton::callback("📊 My progress", "status"),
        ],
    ])
}

/// Shown right after a quest is created, before day 1 is delivered.
pub fn start_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🚀 Start day 1",
        "next",
    )]])
}

/// Deep link from a group welcome into the bot's DM. None when the
/// bot's username is unknown (no usable link target).
pub fn welcome_keyboard(bot_username: &str) -> Option<InlineKeyboardMarkup> {
    if bot_username.is_empty() {
        return None;
    }
    let link = format!("https://t.me/{bot_username}");
    url::Url::parse(&link).ok().map(|url| {
        InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
            "🚀 Start your personal quest",
            url,
        )]])
    })
}
