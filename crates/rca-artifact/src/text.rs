//! Text normalisation helpers shared by payload types and validators

/// Trim and collapse inner whitespace runs to a single space
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison form: collapsed whitespace, lowercase
///
/// Two root texts are the same root when their normalised forms match.
#[must_use]
pub fn normalize(text: &str) -> String {
    collapse_whitespace(text).to_lowercase()
}

/// Whether the option holds non-whitespace content
#[inline]
#[must_use]
pub fn has_content(text: Option<&str>) -> bool {
    text.is_some_and(|t| !t.trim().is_empty())
}

/// Deterministic id derived from a label
///
/// Lowercase ASCII alphanumerics separated by single dashes. Non-ASCII
/// letters are kept so labels in any language still produce distinct ids.
#[must_use]
pub fn slug(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut pending_dash = false;
    for ch in label.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            out.push(ch);
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }
    out
}
