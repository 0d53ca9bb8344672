//! Per-user progress records.

use anyhow::Result;
use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::sync::Arc;

use super::RowStore;
use crate::utils::datetime::local_date;

/// A user's position in the plan plus the groups they have been seen
/// in. `current_day` starts at 1 and only ever moves forward; reading
/// back a previous day never touches it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    pub user_id: String,
    pub username: String,
    pub current_day: u32,
    pub last_read_at: String,
    pub linked_group_ids: BTreeSet<String>,
}

/// Sheet layout: `user_id | username | current_day | last_read_at |
/// group_ids` (comma-separated), header in row 1.
pub struct ProgressStore<S> {
    store: Arc<S>,
    sheet: String,
    timezone: Option<Tz>,
}

fn parse_record(row: &[String]) -> ProgressRecord {
    let get = |i: usize| row.get(i).cloned().unwrap_or_default();
    ProgressRecord {
        user_id: get(0).trim().to_string(),
        username: get(1),
        current_day: get(2).trim().parse().unwrap_or(1),
        last_read_at: get(3),
        linked_group_ids: get(4)
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

impl<S: RowStore> ProgressStore<S> {
    pub fn new(store: Arc<S>, sheet: impl Into<String>, timezone: Option<Tz>) -> Self {
        Self {
            store,
            sheet: sheet.into(),
            timezone,
        }
    }

    /// Linear scan on string-equal user id; first match wins. Also
    /// returns the 1-based sheet row for in-place updates.
    async fn locate(&self, user_id: &str) -> Result<Option<(ProgressRecord, usize)>> {
        let rows = self
            .store
            .get_range(&format!("{}!A2:E", self.sheet))
            .await?;
        for (i, row) in rows.iter().enumerate() {
            if row.is_empty() {
                continue;
            }
            if row[0].trim() == user_id.trim() {
                return Ok(Some((parse_record(row), i + 2)));
            }
        }
        Ok(None)
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<ProgressRecord>> {
        Ok(self.locate(user_id).await?.map(|(record, _)| record))
    }

    /// Full-row overwrite when the user exists, append otherwise.
    ///
    /// `last_read_at: None` defaults to today in the process timezone;
    /// `group_ids: None` preserves whatever the record already links
    /// (merge semantics, not clear).
    pub async fn upsert(
        &self,
        user_id: &str,
        username: &str,
        current_day: u32,
        last_read_at: Option<&str>,
        group_ids: Option<&BTreeSet<String>>,
    ) -> Result<()> {
        let existing = self.locate(user_id).await?;
        let last_read_at = match last_read_at {
            Some(value) => value.to_string(),
            None => local_date(self.timezone).format("%Y-%m-%d").to_string(),
        };
        let groups = match (group_ids, &existing) {
            (Some(ids), _) => ids.clone(),
            (None, Some((record, _))) => record.linked_group_ids.clone(),
            (None, None) => BTreeSet::new(),
        };
        let values = [
            user_id.to_string(),
            username.to_string(),
            current_day.to_string(),
            last_read_at,
            groups.iter().cloned().collect::<Vec<_>>().join(","),
        ];
        match existing {
            Some((_, row)) => {
                self.store
                    .update_row(&format!("{}!A{row}:E{row}", self.sheet), &values)
                    .await
            }
            None => {
                self.store
                    .append_row(&format!("{}!A:E", self.sheet), &values)
                    .await
            }
        }
    }

    /// Union a group id into an existing record. Users without a
    /// record are left alone; records are only created by the start
    /// command. Returns whether anything was written.
    pub async fn link_group(&self, user_id: &str, chat_id: &str) -> Result<bool> {
        let Some((record, row)) = self.locate(user_id).await? else {
            return Ok(false);
        };
        if record.linked_group_ids.contains(chat_id) {
            return Ok(false);
        }
        let mut groups = record.linked_group_ids;
        groups.insert(chat_id.to_string());
        let values = [
            record.user_id,
            record.username,
            record.current_day.to_string(),
            record.last_read_at,
            groups.iter().cloned().collect::<Vec<_>>().join(","),
        ];
        self.store
            .update_row(&format!("{}!A{row}:E{row}", self.sheet), &values)
            .await?;
        Ok(true)
    }
}
