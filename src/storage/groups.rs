//! Registry of community groups and their broadcast settings.

use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;

use super::RowStore;

pub const DEFAULT_NOTIFICATION_TIME: &str = "08:00";

/// One registered chat. Optional fields fall back to the process-wide
/// defaults at the point of use, never here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupRecord {
    pub chat_id: String,
    pub plan_sheet: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub timezone: Option<String>,
    pub notification_time: String,
}

/// Sheet layout: `chat_id | plan_sheet | start_date | timezone |
/// notification_time`, header in row 1.
pub struct GroupStore<S> {
    store: Arc<S>,
    sheet: String,
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

fn optional(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_record(row: &[String]) -> Option<GroupRecord> {
    let chat_id = row.first()?.trim().to_string();
    if chat_id.is_empty() {
        return None;
    }
    Some(GroupRecord {
        chat_id,
        plan_sheet: optional(row.get(1)),
        start_date: row.get(2).and_then(|s| parse_date(s)),
        timezone: optional(row.get(3)),
        notification_time: optional(row.get(4))
            .unwrap_or_else(|| DEFAULT_NOTIFICATION_TIME.to_string()),
    })
}

impl<S: RowStore> GroupStore<S> {
    pub fn new(store: Arc<S>, sheet: impl Into<String>) -> Self {
        Self {
            store,
            sheet: sheet.into(),
        }
    }

    pub async fn list(&self) -> Result<Vec<GroupRecord>> {
        let rows = self
            .store
            .get_range(&format!("{}!A2:E", self.sheet))
            .await?;
        Ok(rows.iter().filter_map(|row| parse_record(row)).collect())
    }

    pub async fn append(&self, record: &GroupRecord) -> Result<()> {
        let values = [
            record.chat_id.clone(),
            record.plan_sheet.clone().unwrap_or_default(),
            record
                .start_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            record.timezone.clone().unwrap_or_default(),
            record.notification_time.clone(),
        ];
        self.store
            .append_row(&format!("{}!A:E", self.sheet), &values)
            .await
    }

    /// 1-based sheet row of the group, or None when unregistered.
    async fn find_row(&self, chat_id: &str) -> Result<Option<usize>> {
        let rows = self
            .store
            .get_range(&format!("{}!A2:A", self.sheet))
            .await?;
        for (i, row) in rows.iter().enumerate() {
            if row.first().map(|s| s.trim()) == Some(chat_id.trim()) {
                return Ok(Some(i + 2));
            }
        }
        Ok(None)
    }

    /// Single-cell update; `Ok(false)` when the chat id is absent.
    pub async fn update_start_date(&self, chat_id: &str, date: NaiveDate) -> Result<bool> {
        let Some(row) = self.find_row(chat_id).await? else {
            return Ok(false);
        };
        self.store
            .update_row(
                &format!("{}!C{row}", self.sheet),
                &[date.format("%Y-%m-%d").to_string()],
            )
            .await?;
        Ok(true)
    }

    /// Single-cell update; `Ok(false)` when the chat id is absent.
    pub async fn update_notification_time(&self, chat_id: &str, value: &str) -> Result<bool> {
        let Some(row) = self.find_row(chat_id).await? else {
            return Ok(false);
        };
        self.store
            .update_row(&format!("{}!E{row}", self.sheet), &[value.to_string()])
            .await?;
        Ok(true)
    }
}
