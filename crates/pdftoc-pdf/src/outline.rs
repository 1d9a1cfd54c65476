//! Hierarchical outline resolution.
//!
//! An authored bookmark tree is trusted whenever it yields at least one
//! entry with a resolvable destination. Otherwise headings are detected
//! from page content by combining three signals: font sizes that stand
//! out against the page's modal size, bold spans, and section-numbering
//! labels. Either way the result is emitted in reading order.

use std::collections::HashMap;

use pdftoc_core::{DocumentHandle, HeadingLevel, OutlineEntry, Span};

use crate::config::ExtractionConfig;
use crate::same_size;
use crate::text::{clean_text, label_depth};

/// Bold alone is a weak signal; inline emphasis can run long, headings
/// rarely do.
const BOLD_ONLY_MAX_CHARS: usize = 100;

type Strategy = fn(&dyn DocumentHandle, &ExtractionConfig) -> Option<Vec<OutlineEntry>>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("bookmarks", try_bookmarks),
    ("content-patterns", try_content_patterns),
];

/// Resolves the document outline in reading order. An empty outline is a
/// valid result for documents with no discernible structure.
pub fn resolve_outline(doc: &dyn DocumentHandle, config: &ExtractionConfig) -> Vec<OutlineEntry> {
    for (name, strategy) in STRATEGIES {
        let Some(mut entries) = strategy(doc, config) else {
            continue;
        };
        if entries.is_empty() {
            continue;
        }
        if entries.len() > config.max_outline_items {
            entries.truncate(config.max_outline_items);
            tracing::debug!(
                strategy = name,
                kept = config.max_outline_items,
                "outline truncated"
            );
        }
        tracing::debug!(strategy = name, entries = entries.len(), "outline resolved");
        return entries;
    }
    Vec::new()
}

// === Strategy 1: authored bookmarks ===

/// Flattens the bookmark tree in document order, mapping nesting depth
/// to heading levels. Entries whose destination never resolved are
/// dropped; if none survive, the content strategy gets its chance.
fn try_bookmarks(doc: &dyn DocumentHandle, _config: &ExtractionConfig) -> Option<Vec<OutlineEntry>> {
    let bookmarks = doc.bookmarks();
    if bookmarks.is_empty() {
        return None;
    }
    let mut entries = Vec::new();
    for bookmark in bookmarks {
        let Some(page) = bookmark.page else {
            continue;
        };
        let text = clean_text(&bookmark.title);
        if text.is_empty() {
            continue;
        }
        entries.push(OutlineEntry {
            level: HeadingLevel::from_depth(bookmark.depth),
            text,
            page,
        });
    }
    if entries.is_empty() { None } else { Some(entries) }
}

// === Strategy 2: content patterns ===

struct Candidate {
    text: String,
    page: u32,
    size: f32,
    label: Option<usize>,
    /// Top-size unlabeled text on the first page, presumed to be the
    /// document's display title rather than a heading.
    display_title: bool,
}

/// Detects headings from page content across the analysis window.
fn try_content_patterns(
    doc: &dyn DocumentHandle,
    config: &ExtractionConfig,
) -> Option<Vec<OutlineEntry>> {
    let pages = doc.page_count().min(config.max_pages_for_analysis);
    if pages == 0 {
        return None;
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for page_index in 0..pages {
        let Ok(spans) = doc.spans(page_index) else {
            // Unreadable pages contribute nothing.
            continue;
        };
        let Some(modal) = modal_font_size(&spans) else {
            continue;
        };
        let page_max = spans.iter().map(|s| s.font_size).fold(f32::MIN, f32::max);
        let first_page_title_size = (page_index == 0
            && page_max >= modal * config.size_outlier_factor)
            .then_some(page_max);

        for span in &spans {
            let text = clean_text(&span.text);
            let length = text.chars().count();
            if length < config.outline_text_min_length || length > config.outline_text_max_length {
                continue;
            }
            let label = label_depth(&text);
            let outlier = span.font_size >= modal * config.size_outlier_factor;
            if label.is_none() && !outlier {
                if !span.bold || length > BOLD_ONLY_MAX_CHARS {
                    continue;
                }
            }
            let display_title = label.is_none()
                && first_page_title_size
                    .is_some_and(|title_size| same_size(span.font_size, title_size));
            candidates.push(Candidate {
                text,
                page: page_index as u32 + 1,
                size: span.font_size,
                label,
                display_title,
            });
        }
    }

    // A presumed display title only stands when it out-sizes every real
    // heading candidate. A same-size heading elsewhere in the document
    // means the first page simply opens with a section.
    let heading_ceiling = candidates
        .iter()
        .filter(|c| !c.display_title)
        .map(|c| c.size)
        .fold(f32::MIN, f32::max);
    candidates.retain(|c| !c.display_title || c.size <= heading_ceiling + 0.1);
    if candidates.is_empty() {
        return None;
    }

    // Distinct candidate sizes ranked descending map to h1..h6. With
    // fewer than two tiers the size says nothing, so label depth decides.
    let tiers = size_tiers(&candidates);
    let use_labels = tiers.len() < 2;

    let mut entries: Vec<OutlineEntry> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let level = if use_labels {
            HeadingLevel::from_depth(candidate.label.unwrap_or(1))
        } else {
            let rank = tiers
                .iter()
                .position(|tier| same_size(*tier, candidate.size))
                .map(|index| index + 1)
                .unwrap_or(6);
            HeadingLevel::from_depth(rank)
        };
        entries.push(OutlineEntry {
            level,
            text: candidate.text,
            page: candidate.page,
        });
    }

    // Running headers repeat verbatim page after page; keep the first.
    entries.dedup_by(|later, earlier| later.text == earlier.text);

    Some(entries)
}

/// The page's most frequent positive font size, bucketed to half a
/// point. Body text dominates a page, so this approximates the body
/// size. Ties go to the larger size.
fn modal_font_size(spans: &[Span]) -> Option<f32> {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    for span in spans {
        if span.font_size > 0.0 && !span.text.trim().is_empty() {
            *counts
                .entry((span.font_size * 2.0).round() as i32)
                .or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .max_by_key(|(bucket, count)| (*count, *bucket))
        .map(|(bucket, _)| bucket as f32 / 2.0)
}

/// Distinct candidate font sizes, descending.
fn size_tiers(candidates: &[Candidate]) -> Vec<f32> {
    let mut sizes: Vec<f32> = Vec::new();
    for candidate in candidates {
        if !sizes.iter().any(|s| same_size(*s, candidate.size)) {
            sizes.push(candidate.size);
        }
    }
    sizes.sort_by(|a, b| b.total_cmp(a));
    sizes
}
