//! Plan-day arithmetic and timezone resolution.
//!
//! A plan day is a 1-based offset from a group's (or the process-wide)
//! start date, computed against the wall-clock date in the relevant
//! timezone. Day 1 is the start date itself; dates before the start
//! date resolve to no day at all.

use chrono::{Local, NaiveDate, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Resolve an IANA timezone name ("Asia/Seoul"). Unknown or empty names
/// yield `None`; callers fall back to the process default timezone and
/// finally to naive local time.
pub fn parse_timezone(name: &str) -> Option<Tz> {
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Tz::from_str(name).ok()
}

/// Today's date in the given timezone, or in naive local time when no
/// timezone could be resolved.
pub fn local_date(tz: Option<Tz>) -> NaiveDate {
    match tz {
        Some(tz) => Utc::now().with_timezone(&tz).date_naive(),
        None => Local::now().date_naive(),
    }
}

/// Current wall-clock time formatted "HH:MM" in the given timezone,
/// used to match group notification times.
pub fn local_hhmm(tz: Option<Tz>) -> String {
    match tz {
        Some(tz) => Utc::now().with_timezone(&tz).format("%H:%M").to_string(),
        None => Local::now().format("%H:%M").to_string(),
    }
}

/// Map a calendar date onto a plan day index.
///
/// `(today - start).days + 1`; the start date itself is day 1. Returns
/// `None` when the plan has not started yet, in which case callers
/// must not look up a plan row.
pub fn resolve_day(today: NaiveDate, start: NaiveDate) -> Option<u32> {
    let day = (today - start).num_days() + 1;
    if day < 1 {
        None
    } else {
        Some(day as u32)
    }
}
