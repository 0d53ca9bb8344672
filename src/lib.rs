//! # Reading Plan Bot
//!
//! A Telegram bot that walks individuals and groups through a daily,
//! multi-day reading plan.
//!
//! ## Features
//! - Personal quest delivery over long-polling commands and inline buttons
//! - Per-user progress tracking (current day, last read date, linked groups)
//! - Scheduled community broadcasts at each group's notification time
//! - Plan, progress, groups and logs persisted in a Google Sheet

/// Update classification, command routing and reply construction
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Outbound message delivery (Telegram transport)
pub mod notify;
/// Background services: scheduled broadcasts and health endpoints
pub mod services;
/// Sheet-backed stores for plan, progress, groups and logs
pub mod storage;
/// Day arithmetic, timezone and link helpers
pub mod utils;
