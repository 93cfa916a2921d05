//! Project-specific utilities live here.

/// Calendar year in UTC.
pub fn current_year() -> i32 {
    time::OffsetDateTime::now_utc().year()
}

/// Shorten `text` to at most `width` characters, marking the cut with `~`.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(width.saturating_sub(1)).collect();
    shortened.push('~');
    shortened
}
