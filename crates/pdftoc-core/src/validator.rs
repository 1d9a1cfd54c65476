//! Schema validation for extraction results.
//!
//! Every result is forced into the output contract before it is written:
//! out-of-range pages are dropped (never clamped), over-long text is
//! truncated, and entries are re-sorted into reading order. Each correction
//! is recorded as a human-readable message so noisy documents can be
//! audited after a run.

use crate::{ExtractionResult, ValidationOutcome};

/// Length ceilings enforced on the final record.
#[derive(Debug, Clone, Copy)]
pub struct ValidationLimits {
    pub title_max_length: usize,
    pub outline_text_max_length: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        ValidationLimits {
            title_max_length: 500,
            outline_text_max_length: 1000,
        }
    }
}

/// Forces `candidate` into a schema-conforming record.
///
/// An empty title or an outline that loses all of its entries is still a
/// valid outcome. Validation never fails, it only corrects.
pub fn validate(
    candidate: ExtractionResult,
    page_count: usize,
    limits: &ValidationLimits,
) -> ValidationOutcome {
    let mut sanitizations = Vec::new();

    let mut title = candidate.title.trim().to_string();
    let title_chars = title.chars().count();
    if title_chars > limits.title_max_length {
        title = truncate_chars(&title, limits.title_max_length);
        note(
            &mut sanitizations,
            format!(
                "title truncated from {title_chars} to {} characters",
                limits.title_max_length
            ),
        );
    }

    let mut outline = Vec::with_capacity(candidate.outline.len());
    for (index, mut entry) in candidate.outline.into_iter().enumerate() {
        entry.text = entry.text.trim().to_string();
        if entry.text.is_empty() {
            note(
                &mut sanitizations,
                format!("outline entry {index} dropped: empty text"),
            );
            continue;
        }
        let text_chars = entry.text.chars().count();
        if text_chars > limits.outline_text_max_length {
            entry.text = truncate_chars(&entry.text, limits.outline_text_max_length);
            note(
                &mut sanitizations,
                format!(
                    "outline entry {index} text truncated from {text_chars} to {} characters",
                    limits.outline_text_max_length
                ),
            );
        }
        if entry.page == 0 {
            note(
                &mut sanitizations,
                format!("outline entry {index} dropped: page 0 is not a valid page"),
            );
            continue;
        }
        if entry.page as usize > page_count {
            note(
                &mut sanitizations,
                format!(
                    "outline entry {index} dropped: page {} exceeds page count {page_count}",
                    entry.page
                ),
            );
            continue;
        }
        outline.push(entry);
    }

    // Stable, so entries on the same page keep their reading order.
    outline.sort_by_key(|entry| entry.page);

    ValidationOutcome {
        result: ExtractionResult { title, outline },
        sanitizations,
    }
}

fn note(sanitizations: &mut Vec<String>, message: String) {
    tracing::debug!("{message}");
    sanitizations.push(message);
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HeadingLevel, OutlineEntry};

    fn entry(level: HeadingLevel, text: &str, page: u32) -> OutlineEntry {
        OutlineEntry {
            level,
            text: text.to_string(),
            page,
        }
    }

    #[test]
    fn conforming_result_passes_through_untouched() {
        let candidate = ExtractionResult {
            title: "A Study of Things".to_string(),
            outline: vec![
                entry(HeadingLevel::H1, "Introduction", 1),
                entry(HeadingLevel::H2, "Background", 2),
            ],
        };
        let outcome = validate(candidate.clone(), 10, &ValidationLimits::default());
        assert_eq!(outcome.result, candidate);
        assert!(outcome.sanitizations.is_empty());
    }

    #[test]
    fn empty_title_and_outline_are_valid() {
        let outcome = validate(ExtractionResult::default(), 3, &ValidationLimits::default());
        assert_eq!(outcome.result.title, "");
        assert!(outcome.result.outline.is_empty());
        assert!(outcome.sanitizations.is_empty());
    }

    #[test]
    fn out_of_range_pages_are_dropped_not_clamped() {
        let candidate = ExtractionResult {
            title: String::new(),
            outline: vec![
                entry(HeadingLevel::H1, "Kept", 2),
                entry(HeadingLevel::H1, "Beyond the end", 9),
                entry(HeadingLevel::H1, "Zero page", 0),
            ],
        };
        let outcome = validate(candidate, 5, &ValidationLimits::default());
        assert_eq!(outcome.result.outline.len(), 1);
        assert_eq!(outcome.result.outline[0].text, "Kept");
        // No surviving entry may carry a page outside 1..=page_count.
        assert!(outcome
            .result
            .outline
            .iter()
            .all(|e| e.page >= 1 && e.page <= 5));
        assert_eq!(outcome.sanitizations.len(), 2);
        assert!(
            outcome.sanitizations[0].contains("exceeds page count 5"),
            "got: {:?}",
            outcome.sanitizations,
        );
    }

    #[test]
    fn zero_page_count_drops_every_entry() {
        let candidate = ExtractionResult {
            title: "Empty Shell".to_string(),
            outline: vec![entry(HeadingLevel::H1, "Ghost", 1)],
        };
        let outcome = validate(candidate, 0, &ValidationLimits::default());
        assert!(outcome.result.outline.is_empty());
        assert_eq!(outcome.sanitizations.len(), 1);
    }

    #[test]
    fn over_long_title_is_truncated_on_char_boundary() {
        let candidate = ExtractionResult {
            title: "é".repeat(600),
            outline: Vec::new(),
        };
        let outcome = validate(candidate, 1, &ValidationLimits::default());
        assert_eq!(outcome.result.title.chars().count(), 500);
        assert_eq!(outcome.sanitizations.len(), 1);
        assert!(outcome.sanitizations[0].contains("truncated from 600 to 500"));
    }

    #[test]
    fn over_long_entry_text_is_truncated_but_kept() {
        let candidate = ExtractionResult {
            title: String::new(),
            outline: vec![entry(HeadingLevel::H2, &"x".repeat(1500), 1)],
        };
        let outcome = validate(candidate, 1, &ValidationLimits::default());
        assert_eq!(outcome.result.outline.len(), 1);
        assert_eq!(outcome.result.outline[0].text.chars().count(), 1000);
        assert_eq!(outcome.sanitizations.len(), 1);
    }

    #[test]
    fn whitespace_only_entries_are_dropped() {
        let candidate = ExtractionResult {
            title: String::new(),
            outline: vec![
                entry(HeadingLevel::H1, "   ", 1),
                entry(HeadingLevel::H1, "Real", 1),
            ],
        };
        let outcome = validate(candidate, 2, &ValidationLimits::default());
        assert_eq!(outcome.result.outline.len(), 1);
        assert_eq!(outcome.result.outline[0].text, "Real");
    }

    #[test]
    fn entries_are_reordered_by_page_keeping_ties_stable() {
        let candidate = ExtractionResult {
            title: String::new(),
            outline: vec![
                entry(HeadingLevel::H1, "Chapter Two", 5),
                entry(HeadingLevel::H1, "Chapter One", 2),
                entry(HeadingLevel::H2, "First on page five", 5),
            ],
        };
        let outcome = validate(candidate, 10, &ValidationLimits::default());
        let texts: Vec<_> = outcome
            .result
            .outline
            .iter()
            .map(|e| e.text.as_str())
            .collect();
        // Ties on page 5 keep their original relative order.
        assert_eq!(texts, vec!["Chapter One", "Chapter Two", "First on page five"]);
        assert!(outcome.sanitizations.is_empty());
    }
}
