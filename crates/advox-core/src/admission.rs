//! Inbound text admission — length clamping before the engine is called.

/// Clamp `text` to its first `max_len` characters.
///
/// Returns the admitted text and whether it was truncated. Clamping counts
/// Unicode scalar values, not bytes, so multi-byte text never splits inside
/// a character. Must run before the engine call — an in-flight stream cannot
/// be truncated.
pub fn admit(text: &str, max_len: usize) -> (&str, bool) {
    match text.char_indices().nth(max_len) {
        Some((byte_end, _)) => (&text[..byte_end], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_passes_through() {
        let (out, truncated) = admit("hello", 5000);
        assert_eq!(out, "hello");
        assert!(!truncated);
    }

    #[test]
    fn text_at_limit_passes_through() {
        let text = "x".repeat(5000);
        let (out, truncated) = admit(&text, 5000);
        assert_eq!(out.chars().count(), 5000);
        assert!(!truncated);
    }

    #[test]
    fn over_limit_text_is_clamped() {
        let text = "y".repeat(6000);
        let (out, truncated) = admit(&text, 5000);
        assert_eq!(out.chars().count(), 5000);
        assert!(truncated);
    }

    #[test]
    fn clamping_counts_chars_not_bytes() {
        // 4 chars, 8 bytes
        let (out, truncated) = admit("éééé", 3);
        assert_eq!(out, "ééé");
        assert!(truncated);
    }

    #[test]
    fn empty_text_is_admitted() {
        let (out, truncated) = admit("", 5000);
        assert_eq!(out, "");
        assert!(!truncated);
    }
}
