//! Append-only audit trail of command outcomes.

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use super::RowStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogStatus {
    Ok,
    Error,
}

impl LogStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LogStatus::Ok => "ok",
            LogStatus::Error => "error",
        }
    }
}

/// Write-only sink; the bot never reads this sheet back. A failed
/// append must never break the handler that produced it, so errors are
/// logged at debug and swallowed.
pub struct ActivityLog<S> {
    store: Arc<S>,
    sheet: String,
}

impl<S: RowStore> ActivityLog<S> {
    pub fn new(store: Arc<S>, sheet: impl Into<String>) -> Self {
        Self {
            store,
            sheet: sheet.into(),
        }
    }

    pub async fn append(
        &self,
        chat_id: &str,
        chat_type: &str,
        username: &str,
        command: &str,
        status: LogStatus,
        note: &str,
    ) {
        let values = [
            Utc::now().to_rfc3339(),
            chat_id.to_string(),
            chat_type.to_string(),
            username.to_string(),
            command.to_string(),
            status.as_str().to_string(),
            note.to_string(),
        ];
        if let Err(e) = self
            .store
            .append_row(&format!("{}!A:G", self.sheet), &values)
            .await
        {
            debug!("activity log append failed: {e:#}");
        }
    }
}
