//! Plan message rendering.

use teloxide::utils::html::escape;

use crate::storage::plan::PlanEntry;

/// Length of the full plan as shown in community progress lines. The
/// fraction is presentational and independent of how many rows the
/// sheet actually has; days past the end read over 100%.
pub const TOTAL_DAYS: u32 = 66;

/// Sentinel cell values meaning "no parallel passage here".
const PARALLEL_NONE: &str = "-";
/// Marker for passages unique to this gospel.
const PARALLEL_UNIQUE: &str = "unique";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// One-on-one quest delivery in a DM.
    Personal,
    /// Scheduled community broadcast into a group.
    Community,
}

impl Audience {
    fn label(self) -> &'static str {
        match self {
            Audience::Personal => "Personal",
            Audience::Community => "Community",
        }
    }
}

fn parallel_is_valid(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != PARALLEL_NONE && !value.eq_ignore_ascii_case(PARALLEL_UNIQUE)
}

/// Build the message body for one plan day (HTML parse mode).
///
/// Personal messages are verse-centric: when any parallel reference is
/// valid they list the parallels in place of the summary, and when none
/// are they carry no summary at all. Community messages always include
/// the summary and close with a progress fraction.
pub fn render_plan_message(day: u32, entry: &PlanEntry, audience: Audience) -> String {
    let reference = escape(entry.reference.trim());
    let title = escape(entry.title.trim());
    let mut msg = format!("[{} DAY {day}] {reference} ({title})\n\n", audience.label());

    let verse = entry.verse_text.trim();
    if !verse.is_empty() {
        let verse_ref = entry.verse_ref.trim();
        if verse_ref.is_empty() {
            msg.push_str(&format!("📖 <i>\"{}\"</i>\n\n", escape(verse)));
        } else {
            msg.push_str(&format!(
                "📖 <i>\"{}\"</i> ({})\n\n",
                escape(verse),
                escape(verse_ref)
            ));
        }
    }

    let parallels = [
        ("Matthew", entry.parallel_matthew.as_str()),
        ("Mark", entry.parallel_mark.as_str()),
        ("Luke", entry.parallel_luke.as_str()),
    ];
    let valid: Vec<_> = parallels
        .iter()
        .filter(|(_, value)| parallel_is_valid(value))
        .collect();
    if !valid.is_empty() {
        msg.push_str("🔀 <b>Parallel passages</b>\n");
        for (source, value) in &valid {
            msg.push_str(&format!("- {source}: {}\n", escape(value.trim())));
        }
        msg.push('\n');
    }

    // Community readers always get the summary; personal delivery is
    // verse-only unless parallels replaced it above.
    if audience == Audience::Community && !entry.summary.trim().is_empty() {
        msg.push_str(&format!(
            "📖 <b>What it covers</b>\n{}\n\n",
            escape(entry.summary.trim())
        ));
    }

    let youtube = entry.youtube_link.trim();
    if !youtube.is_empty() {
        msg.push_str(&format!(
            "🎧 <a href=\"{}\">Listen to today's passage</a>\n\n",
            escape(youtube)
        ));
    }

    match audience {
        Audience::Personal => {
            msg.push_str("Feel free to share a verse that stood out to you.\n");
            msg.push_str("Get your next quest with /next, or check progress with /status.");
        }
        Audience::Community => {
            msg.push_str("Read along and check in freely: a quiz, a verse, anything. 🙌\n\n");
            let percent = day * 100 / TOTAL_DAYS;
            msg.push_str(&format!(
                "Progress: {day}/{TOTAL_DAYS} ({percent}% complete!)"
            ));
        }
    }
    msg
}
