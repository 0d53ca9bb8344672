//! Reading-plan cache, keyed by day number.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::RowStore;

/// One day's content. Missing columns default to empty strings; the
/// renderer must never see a null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanEntry {
    pub day: u32,
    pub reference: String,
    pub title: String,
    pub summary: String,
    pub verse_text: String,
    pub verse_ref: String,
    pub image_url: String,
    pub youtube_link: String,
    pub parallel_matthew: String,
    pub parallel_mark: String,
    pub parallel_luke: String,
}

/// In-memory view of one plan sheet, rebuilt in bulk by [`reload`].
///
/// Row 1 is a header naming the columns; the store maps names to
/// indices so the sheet can reorder or grow columns without breaking.
///
/// [`reload`]: PlanStore::reload
pub struct PlanStore<S> {
    store: Arc<S>,
    sheet: String,
    cache: HashMap<u32, PlanEntry>,
}

struct ColumnMap {
    day: Option<usize>,
    reference: Option<usize>,
    title: Option<usize>,
    summary: Option<usize>,
    verse_text: Option<usize>,
    verse_ref: Option<usize>,
    image_url: Option<usize>,
    youtube_link: Option<usize>,
    matthew: Option<usize>,
    mark: Option<usize>,
    luke: Option<usize>,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Self {
        let find = |name: &str| {
            header
                .iter()
                .position(|cell| cell.trim().eq_ignore_ascii_case(name))
        };
        Self {
            day: find("day"),
            reference: find("ref"),
            title: find("title"),
            summary: find("summary"),
            verse_text: find("verse_text"),
            verse_ref: find("verse_ref"),
            image_url: find("image_url"),
            youtube_link: find("youtube_link"),
            matthew: find("matthew"),
            mark: find("mark"),
            luke: find("luke"),
        }
    }
}

/// First run of ASCII digits anywhere in the cell, so "Day 3", "3차"
/// and plain "3" all resolve to 3. Cells with no digits parse to
/// nothing and the row is skipped.
fn first_digit_run(raw: &str) -> Option<u32> {
    let digits: String = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn cell(row: &[String], index: Option<usize>) -> String {
    index
        .and_then(|i| row.get(i))
        .cloned()
        .unwrap_or_default()
}

impl<S: RowStore> PlanStore<S> {
    pub fn new(store: Arc<S>, sheet: impl Into<String>) -> Self {
        Self {
            store,
            sheet: sheet.into(),
            cache: HashMap::new(),
        }
    }

    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Rebuild the day-keyed cache from the sheet. Malformed rows are
    /// skipped, never fatal. Returns the number of cached entries.
    pub async fn reload(&mut self) -> Result<usize> {
        let rows = self
            .store
            .get_range(&format!("{}!A1:L", self.sheet))
            .await?;
        self.cache.clear();
        if rows.is_empty() {
            return Ok(0);
        }

        let columns = ColumnMap::from_header(&rows[0]);
        for row in rows.iter().skip(1) {
            if row.is_empty() {
                continue;
            }
            // No "Day" header: fall back to column A.
            let day_cell = match columns.day {
                Some(i) => row.get(i).cloned().unwrap_or_default(),
                None => row.first().cloned().unwrap_or_default(),
            };
            let Some(day) = first_digit_run(day_cell.trim()) else {
                continue;
            };
            let entry = PlanEntry {
                day,
                reference: cell(row, columns.reference),
                title: cell(row, columns.title),
                summary: cell(row, columns.summary),
                verse_text: cell(row, columns.verse_text),
                verse_ref: cell(row, columns.verse_ref),
                image_url: cell(row, columns.image_url),
                youtube_link: cell(row, columns.youtube_link),
                parallel_matthew: cell(row, columns.matthew),
                parallel_mark: cell(row, columns.mark),
                parallel_luke: cell(row, columns.luke),
            };
            if self.cache.insert(day, entry).is_some() {
                warn!(
                    "duplicate day {} in sheet '{}'; keeping the later row",
                    day, self.sheet
                );
            }
        }
        Ok(self.cache.len())
    }

    pub fn get_by_day(&self, day: u32) -> Option<&PlanEntry> {
        self.cache.get(&day)
    }
}
