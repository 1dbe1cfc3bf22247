//! Short-summary post-processing.

use std::sync::LazyLock;

use regex::Regex;

/// Leading "TL;DR" label with any surrounding punctuation or emphasis.
static SUMMARY_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\s\W_]*tl[;:]?dr(?:[\s\W_]+|$)").expect("SUMMARY_LABEL regex should compile")
});

/// Remove a leading `TL;DR`-style label and trim.
pub fn strip_summary_label(raw: &str) -> String {
    SUMMARY_LABEL.replace(raw, "").trim().to_string()
}
