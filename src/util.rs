// src/util.rs — Shared utility functions

/// Truncate a string for display/logging (UTF-8 safe).
///
/// Returns a substring of at most `max_len` bytes, ensuring the cut
/// point falls on a valid UTF-8 character boundary.
pub fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

/// Truncate for display with a trailing ellipsis when anything was cut.
pub fn ellipsize(s: &str, max_len: usize) -> String {
    let cut = truncate_str(s, max_len);
    if cut.len() == s.len() {
        cut.to_string()
    } else {
        format!("{}...", cut)
    }
}
