//! Text matching used by locators and assertions.
//!
//! Message checks compare whitespace-normalised text by substring
//! containment. Rendered DOM text wraps and indents freely, so runs of
//! whitespace collapse to one space before comparing.

/// Collapse every whitespace run to a single space and trim the ends
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-sensitive containment over normalised text
#[must_use]
pub fn contains_normalized(haystack: &str, needle: &str) -> bool {
    normalize_whitespace(haystack).contains(&normalize_whitespace(needle))
}

/// Return the needles that are not contained in `haystack`, in input order
#[must_use]
pub fn missing_fragments<'a>(haystack: &str, needles: &[&'a str]) -> Vec<&'a str> {
    let normalized = normalize_whitespace(haystack);
    needles
        .iter()
        .copied()
        .filter(|needle| !normalized.contains(&normalize_whitespace(needle)))
        .collect()
}

/// Shorten long observations for error messages
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}…")
}
