//! Sheet-backed storage.
//!
//! The durable source of truth is a spreadsheet; every store reads its
//! rows fresh per logical operation (only the plan keeps an explicit
//! reload cache). The row-store contract is at-least-once with no
//! transactions; last write wins.

pub mod groups;
pub mod log;
pub mod plan;
pub mod progress;
pub mod sheets;

use anyhow::Result;
use async_trait::async_trait;

/// Rectangular row-store primitives over A1-style ranges.
///
/// Implemented by [`sheets::SheetsClient`] in production and by an
/// in-memory store in tests.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Fetch the cell matrix for a range, e.g. `"plan!A1:L"`. Rows may
    /// be ragged; trailing empty cells are not guaranteed to be present.
    async fn get_range(&self, range: &str) -> Result<Vec<Vec<String>>>;

    /// Append a single row after the last data row of the range.
    async fn append_row(&self, range: &str, values: &[String]) -> Result<()>;

    /// Overwrite cells starting at the top-left of the range.
    async fn update_row(&self, range: &str, values: &[String]) -> Result<()>;
}
