use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::env;

/// Process-wide configuration, read once at startup. Missing required
/// variables are fatal; everything else has a sensible default.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    /// Fallback identity when the getMe lookup fails.
    pub bot_username: String,
    pub spreadsheet_id: String,
    pub google_api_token: String,
    pub plan_sheet: String,
    pub progress_sheet: String,
    pub groups_sheet: String,
    pub log_sheet: String,
    pub start_date: NaiveDate,
    pub timezone: String,
    pub request_timeout_secs: u64,
    pub poll_timeout_secs: u32,
    /// Suppress all outbound delivery and log intent instead.
    pub dry_run: bool,
    pub http_port: u16,
}

fn required(name: &str) -> Result<String> {
    let value = env::var(name).unwrap_or_default();
    if value.trim().is_empty() {
        return Err(anyhow!("{name} must be set"));
    }
    Ok(value)
}

fn optional(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default.to_string(),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let telegram_bot_token = required("TELEGRAM_BOT_TOKEN")?;
        let spreadsheet_id = required("SPREADSHEET_ID")?;
        let google_api_token = required("GOOGLE_API_TOKEN")?;

        let start_date_raw = optional("START_DATE", "2025-12-01");
        let start_date = NaiveDate::parse_from_str(start_date_raw.trim(), "%Y-%m-%d")
            .map_err(|_| anyhow!("Invalid START_DATE '{start_date_raw}' (expected YYYY-MM-DD)"))?;

        let request_timeout_secs = optional("REQUEST_TIMEOUT_SECONDS", "15")
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid REQUEST_TIMEOUT_SECONDS"))?;
        let poll_timeout_secs = optional("POLL_TIMEOUT_SECONDS", "20")
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid POLL_TIMEOUT_SECONDS"))?;
        let http_port = optional("HTTP_PORT", "3000")
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;
        let dry_run = optional("DRY_RUN", "false").trim().eq_ignore_ascii_case("true");

        Ok(Config {
            telegram_bot_token,
            bot_username: optional("BOT_USERNAME", ""),
            spreadsheet_id,
            google_api_token,
            plan_sheet: optional("PLAN_SHEET_NAME", "plan"),
            progress_sheet: optional("PROGRESS_SHEET_NAME", "progress"),
            groups_sheet: optional("GROUPS_SHEET_NAME", "groups"),
            log_sheet: optional("LOG_SHEET_NAME", "logs"),
            start_date,
            timezone: optional("TIMEZONE", "Asia/Seoul"),
            request_timeout_secs,
            poll_timeout_secs,
            dry_run,
            http_port,
        })
    }
}
