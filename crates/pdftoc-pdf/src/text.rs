//! Text cleanup and heading-label recognition shared by title and
//! outline extraction.

use once_cell::sync::Lazy;
use regex::Regex;

/// Normalizes raw span text: control characters become spaces, dot
/// leaders from table-of-contents lines are removed, and whitespace
/// runs collapse to a single space.
pub fn clean_text(raw: &str) -> String {
    static DOT_LEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.{4,}").unwrap());
    static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

    let without_controls: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let without_leaders = DOT_LEADER_RE.replace_all(&without_controls, " ");
    WHITESPACE_RE
        .replace_all(&without_leaders, " ")
        .trim()
        .to_string()
}

/// Dot-separated arabic numbering depth of a heading, when it has one.
///
/// `"2 Background"` is depth 1, `"2.4.1 Results"` is depth 3. Components
/// are capped at three digits so year leaders like `"2024 Annual Report"`
/// do not read as section numbers.
pub fn numbering_depth(text: &str) -> Option<usize> {
    static NUMBERED_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(\d{1,3}(?:\.\d{1,3})*)[.)]?\s+\S").unwrap());

    let caps = NUMBERED_RE.captures(text)?;
    let numbering = caps.get(1).map(|m| m.as_str())?;
    Some(numbering.matches('.').count() + 1)
}

/// Structural label depth of a heading leader, covering arabic numbering
/// plus appendix-style letter and roman-numeral leaders and chapter
/// keywords.
///
/// Bare letters and romans are only accepted with trailing punctuation
/// (`"A. Proofs"`, `"IV) Results"`). Without it, openers like
/// `"A Survey of Methods"` would read as labels.
pub fn label_depth(text: &str) -> Option<usize> {
    if let Some(depth) = numbering_depth(text) {
        return Some(depth);
    }

    static KEYWORD_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^(?:chapter|section|part|appendix|annex)\s+(?:\d{1,3}|[IVXLC]{1,7}|[A-Z])\b")
            .unwrap()
    });
    if KEYWORD_RE.is_match(text) {
        return Some(1);
    }

    static LETTERED_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^(?:[A-Z]|[IVXLC]{2,7}|[ivxlc]{2,7})((?:\.\d{1,3})+|[.)])\s+\S").unwrap()
    });
    let caps = LETTERED_RE.captures(text)?;
    let tail = caps.get(1).map(|m| m.as_str())?;
    if tail.starts_with('.') && tail.len() > 1 {
        Some(tail.matches('.').count() + 1)
    } else {
        Some(1)
    }
}
