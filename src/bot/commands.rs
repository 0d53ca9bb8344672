//! Command names and their parser.
//!
//! Only the first whitespace-delimited token counts; trailing
//! arguments are ignored, and an optional `@BotName` suffix is
//! stripped so group mentions parse the same as bare commands.
//! Unrecognized commands parse to nothing and are silently dropped by
//! the dispatcher.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Entry point / help in a private chat.
    Start,
    /// Create-or-show personal quest progress.
    StartJohn,
    /// Deliver the current day and advance.
    Next,
    /// Read-only progress report.
    Status,
    /// Re-deliver the previously completed day.
    Repeat,
    /// Show today's community reading for the user's groups.
    TodayGroup,
    /// Force a plan cache refresh.
    Reload,
    /// Register the invoking group for broadcasts.
    RegisterGroup,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        let first = text.trim().split_whitespace().next()?;
        let name = first.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or("");
        match name {
            "start" => Some(Self::Start),
            "start_john" => Some(Self::StartJohn),
            "next" => Some(Self::Next),
            "status" => Some(Self::Status),
            "repeat" => Some(Self::Repeat),
            "today_group" => Some(Self::TodayGroup),
            "reload" => Some(Self::Reload),
            "register_group" => Some(Self::RegisterGroup),
            _ => None,
        }
    }

    /// Canonical form for the activity log.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "/start",
            Self::StartJohn => "/start_john",
            Self::Next => "/next",
            Self::Status => "/status",
            Self::Repeat => "/repeat",
            Self::TodayGroup => "/today_group",
            Self::Reload => "/reload",
            Self::RegisterGroup => "/register_group",
        }
    }
}
