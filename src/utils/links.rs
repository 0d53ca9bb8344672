//! Small parsing helpers for outbound destinations and media links.

/// Rewrite a Google Drive viewer URL (`.../file/d/<id>/view`) into the
/// direct-download form the photo API can fetch. Any other URL passes
/// through unchanged.
pub fn direct_drive_url(url: &str) -> String {
    if let Some(idx) = url.find("/file/d/") {
        let rest = &url[idx + "/file/d/".len()..];
        let file_id = rest.split('/').next().unwrap_or("");
        if !file_id.is_empty() {
            return format!("https://drive.google.com/uc?id={file_id}");
        }
    }
    url.to_string()
}

/// Split a configured chat destination into a chat id and an optional
/// topic/thread id. Group sheets may carry ids like `-100123_456`,
/// where `456` is the forum thread to post into. Anything that does not
/// match the `<digits>_<digits>` shape is returned as-is.
pub fn parse_chat_destination(raw: &str) -> (String, Option<i32>) {
    let trimmed = raw.trim();
    if let Some((chat, thread)) = trimmed.split_once('_') {
        let digits = chat.strip_prefix('-').unwrap_or(chat);
        let chat_ok = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
        if chat_ok {
            if let Ok(thread_id) = thread.parse::<u32>() {
                return (chat.to_string(), Some(thread_id as i32));
            }
        }
    }
    (trimmed.to_string(), None)
}
