//! Shared utilities for TUI views

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncate_at = max_len.saturating_sub(3);
        let truncated: String = s.chars().take(truncate_at).collect();
        format!("{}...", truncated)
    }
}

/// First visible row of a list of `height` rows that keeps `cursor` on screen.
///
/// Drawing and mouse hit-testing both use this, so a click maps back to the
/// row that was actually drawn there.
pub fn viewport_offset(cursor: usize, height: usize) -> usize {
    if height == 0 {
        return cursor;
    }
    (cursor + 1).saturating_sub(height)
}
