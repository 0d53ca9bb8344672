//! Shared test doubles: an in-memory row store and a recording
//! notifier, plus a canned configuration.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use teloxide::types::InlineKeyboardMarkup;

use reading_plan_bot::config::Config;
use reading_plan_bot::notify::{Destination, Notifier};
use reading_plan_bot::storage::RowStore;

// ---------------------------------------------------------------------------
// In-memory row store
// ---------------------------------------------------------------------------

/// Sheet-shaped storage backed by vectors, addressed with the same
/// A1-style ranges the real client uses.
#[derive(Default)]
pub struct MemStore {
    sheets: Mutex<HashMap<String, Vec<Vec<String>>>>,
}

fn to_row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|s| s.to_string()).collect()
}

/// "AA" -> 26; zero-based column index.
fn col_index(letters: &str) -> usize {
    letters
        .chars()
        .fold(0usize, |acc, c| {
            acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1)
        })
        .saturating_sub(1)
}

/// "C3" -> (2, Some(3)); "C" -> (2, None).
fn parse_cell(cell: &str) -> (usize, Option<usize>) {
    let letters: String = cell.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits: String = cell.chars().skip_while(|c| c.is_ascii_alphabetic()).collect();
    (col_index(&letters), digits.parse().ok())
}

fn split_range(range: &str) -> Result<(String, &str)> {
    let (sheet, cells) = range
        .split_once('!')
        .ok_or_else(|| anyhow!("range without sheet name: {range}"))?;
    Ok((sheet.to_string(), cells))
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_sheet(&self, name: &str, rows: Vec<Vec<&str>>) {
        let rows = rows.iter().map(|row| to_row(row)).collect();
        self.sheets.lock().unwrap().insert(name.to_string(), rows);
    }

    pub fn sheet(&self, name: &str) -> Vec<Vec<String>> {
        self.sheets
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl RowStore for MemStore {
    async fn get_range(&self, range: &str) -> Result<Vec<Vec<String>>> {
        let (sheet, cells) = split_range(range)?;
        let sheets = self.sheets.lock().unwrap();
        let rows = sheets.get(&sheet).cloned().unwrap_or_default();

        let (start, end) = match cells.split_once(':') {
            Some((start, end)) => (start, end),
            None => (cells, cells),
        };
        let (start_col, start_row) = parse_cell(start);
        let (end_col, end_row) = parse_cell(end);
        let first = start_row.unwrap_or(1);
        let last = end_row.unwrap_or(rows.len());

        Ok(rows
            .iter()
            .enumerate()
            .filter(|(i, _)| (i + 1) >= first && (i + 1) <= last)
            .map(|(_, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(c, _)| *c >= start_col && *c <= end_col)
                    .map(|(_, cell)| cell.clone())
                    .collect()
            })
            .collect())
    }

    async fn append_row(&self, range: &str, values: &[String]) -> Result<()> {
        let (sheet, _) = split_range(range)?;
        self.sheets
            .lock()
            .unwrap()
            .entry(sheet)
            .or_default()
            .push(values.to_vec());
        Ok(())
    }

    async fn update_row(&self, range: &str, values: &[String]) -> Result<()> {
        let (sheet, cells) = split_range(range)?;
        let start = cells.split_once(':').map(|(s, _)| s).unwrap_or(cells);
        let (start_col, start_row) = parse_cell(start);
        let row_index = start_row.ok_or_else(|| anyhow!("update needs a row: {range}"))? - 1;

        let mut sheets = self.sheets.lock().unwrap();
        let rows = sheets.entry(sheet).or_default();
        while rows.len() <= row_index {
            rows.push(Vec::new());
        }
        let row = &mut rows[row_index];
        for (i, value) in values.iter().enumerate() {
            let col = start_col + i;
            while row.len() <= col {
                row.push(String::new());
            }
            row[col] = value.clone();
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Recording notifier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentEvent {
    Text {
        chat_id: i64,
        thread_id: Option<i32>,
        text: String,
        has_keyboard: bool,
    },
    Photo {
        chat_id: i64,
        photo: String,
        caption: String,
    },
    Typing(i64),
    Reaction {
        chat_id: i64,
        message_id: i32,
        emoji: String,
    },
    CallbackAnswer {
        id: String,
        text: Option<String>,
    },
}

#[derive(Default, Clone)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<SentEvent>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SentEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Only text/photo deliveries, ignoring typing and acks.
    pub fn deliveries(&self) -> Vec<SentEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e, SentEvent::Text { .. } | SentEvent::Photo { .. }))
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(
        &self,
        dest: Destination,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        self.events.lock().unwrap().push(SentEvent::Text {
            chat_id: dest.chat_id,
            thread_id: dest.thread_id,
            text: text.to_string(),
            has_keyboard: keyboard.is_some(),
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        dest: Destination,
        photo: &str,
        caption: &str,
        _keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<()> {
        self.events.lock().unwrap().push(SentEvent::Photo {
            chat_id: dest.chat_id,
            photo: photo.to_string(),
            caption: caption.to_string(),
        });
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) {
        self.events.lock().unwrap().push(SentEvent::Typing(chat_id));
    }

    async fn react(&self, chat_id: i64, message_id: i32, emoji: &str) {
        self.events.lock().unwrap().push(SentEvent::Reaction {
            chat_id,
            message_id,
            emoji: emoji.to_string(),
        });
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) {
        self.events.lock().unwrap().push(SentEvent::CallbackAnswer {
            id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
    }
}

// ---------------------------------------------------------------------------
// Canned configuration
// ---------------------------------------------------------------------------

pub fn test_config() -> Config {
    Config {
        telegram_bot_token: "test-token".to_string(),
        bot_username: "reading_plan_bot".to_string(),
        spreadsheet_id: "test-spreadsheet".to_string(),
        google_api_token: "test-api-token".to_string(),
        plan_sheet: "plan".to_string(),
        progress_sheet: "progress".to_string(),
        groups_sheet: "groups".to_string(),
        log_sheet: "logs".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
        timezone: "Asia/Seoul".to_string(),
        request_timeout_secs: 15,
        poll_timeout_secs: 20,
        dry_run: false,
        http_port: 3000,
    }
}
