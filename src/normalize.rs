//! Response normalization: strip markdown decoration from model output.

use once_cell::sync::Lazy;
use regex::Regex;

// ```lang\n ... ``` (language tag optional, inner content may be empty)
static FENCED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+.\-]*[ \t]*\r?\n?(.*?)```").expect("fenced code regex")
});

// `...` on a single line
static INLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]*)`").expect("inline code regex"));

/// Unwrap fenced blocks and inline code spans, then trim.
pub fn normalize(raw: &str) -> String {
    let unfenced = FENCED.replace_all(raw, "$1");
    let unticked = INLINE.replace_all(&unfenced, "$1");
    unticked.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        assert_eq!(normalize("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn strips_untagged_fence_and_surrounding_text_whitespace() {
        assert_eq!(normalize("  \n```\n[1, 2]\n```\n "), "[1, 2]");
    }

    #[test]
    fn strips_inline_code() {
        assert_eq!(normalize("`x`"), "x");
        assert_eq!(normalize("``"), "");
    }

    #[test]
    fn empty_fence_becomes_empty_string() {
        assert_eq!(normalize("``````"), "");
        assert_eq!(normalize("```json\n```"), "");
    }

    #[test]
    fn plain_text_is_only_trimmed() {
        assert_eq!(normalize("  {\"text\": \"hi\"}\n"), "{\"text\": \"hi\"}");
    }

    #[test]
    fn single_line_fence() {
        assert_eq!(normalize("```{\"a\":1}```"), "{\"a\":1}");
    }
}
