//! Detection of the "nothing to report" reply.

/// Phrase the model is instructed to answer with when a file is clean.
pub const NO_ISSUES_PHRASE: &str = "No critical issues found";

/// Whether `text` is the model saying it found nothing.
///
/// Whitespace is removed and case folded on both sides before a prefix
/// comparison, so `"no critical issues found."` and
/// `"No  critical\nissues found"` both count. Leading quotes or backticks
/// are ignored. Empty or absent input is never the sentinel.
///
/// # Examples
///
/// ```
/// use sieve_review::sentinel::is_sentinel;
///
/// assert!(is_sentinel(Some("No critical issues found")));
/// assert!(is_sentinel(Some("  NO CRITICAL ISSUES FOUND.\n")));
/// assert!(!is_sentinel(Some("12 : [Logic] Off by one")));
/// assert!(!is_sentinel(None));
/// ```
pub fn is_sentinel(text: Option<&str>) -> bool {
    is_phrase(text, NO_ISSUES_PHRASE)
}

/// Same check as [`is_sentinel`] against a configured phrase.
pub fn is_phrase(text: Option<&str>, phrase: &str) -> bool {
    let Some(text) = text else {
        return false;
    };
    let wanted = squash(phrase);
    if wanted.is_empty() {
        return false;
    }
    let got = squash(text);
    got.trim_start_matches(['"', '\'', '`', '*'])
        .starts_with(&wanted)
}

/// Whether `text` is the phrase and nothing else, ignoring whitespace,
/// case, quoting and trailing punctuation.
pub fn is_only_phrase(text: &str, phrase: &str) -> bool {
    let wanted = squash(phrase);
    !wanted.is_empty()
        && squash(text).trim_matches(|c: char| c.is_ascii_punctuation()) == wanted
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
