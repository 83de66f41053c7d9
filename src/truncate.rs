//! Input truncation applied before the model sees the text.
//!
//! Caps the *input* at a fixed word budget, independent of the length tier
//! (which only constrains the *output*).

use std::borrow::Cow;

/// Maximum number of whitespace-delimited words passed to the summarizer.
pub const MAX_INPUT_WORDS: usize = 1000;

/// Keep the first `max_words` whitespace-delimited words, rejoined with
/// single spaces.
///
/// Text with at most `max_words` words is returned unchanged (borrowed).
pub fn truncate_words(text: &str, max_words: usize) -> Cow<'_, str> {
    let mut words = text.split_whitespace();
    if words.by_ref().nth(max_words).is_none() {
        return Cow::Borrowed(text);
    }
    let kept: Vec<&str> = text.split_whitespace().take(max_words).collect();
    Cow::Owned(kept.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_untouched() {
        let text = "  keep\tthis   exactly \n";
        let out = truncate_words(text, MAX_INPUT_WORDS);
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(out, text);
    }

    #[test]
    fn exactly_at_cap_is_untouched() {
        let text = vec!["w"; MAX_INPUT_WORDS].join("  ");
        assert!(matches!(truncate_words(&text, MAX_INPUT_WORDS), Cow::Borrowed(_)));
    }

    #[test]
    fn long_text_keeps_first_words_in_order() {
        let words: Vec<String> = (0..2500).map(|i| format!("w{i}")).collect();
        let text = words.join("\n");
        let out = truncate_words(&text, MAX_INPUT_WORDS);
        let kept: Vec<&str> = out.split(' ').collect();
        assert_eq!(kept.len(), 1000);
        assert_eq!(kept[0], "w0");
        assert_eq!(kept[999], "w999");
    }

    #[test]
    fn empty_text() {
        assert_eq!(truncate_words("", 10), "");
        assert_eq!(truncate_words("a b", 0), "");
    }
}
