//! Shared string helpers.

/// Cap `text` at `max_chars` characters, appending `marker` when it was cut.
///
/// Counts `char`s rather than bytes so multi-byte content never splits.
pub fn truncate_chars(text: &str, max_chars: usize, marker: &str) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + marker.len());
            out.push_str(&text[..byte_idx]);
            out.push_str(marker);
            out
        }
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_chars("hello", 10, "..."), "hello");
        assert_eq!(truncate_chars("hello", 5, "..."), "hello");
    }

    #[test]
    fn test_truncate_long_text_marked() {
        assert_eq!(truncate_chars("hello world", 5, "..."), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "héllo wörld";
        assert_eq!(truncate_chars(text, 2, "|"), "hé|");
    }
}
