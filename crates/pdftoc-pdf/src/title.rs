//! Document title resolution.
//!
//! Candidates are tried in order of trust: explicit metadata, authored
//! bookmarks, then layout heuristics over the opening pages. The first
//! candidate that survives the plausibility gate wins. A document with no
//! plausible title resolves to the empty string, which is a valid result.

use once_cell::sync::Lazy;
use regex::Regex;

use pdftoc_core::{DocumentHandle, Span};

use crate::config::ExtractionConfig;
use crate::same_size;
use crate::text::clean_text;

type Strategy = fn(&dyn DocumentHandle, &ExtractionConfig) -> Option<String>;

/// Ordered by trust. Every strategy has the same shape so new ones can
/// be slotted in without touching the resolution loop.
const STRATEGIES: &[(&str, Strategy)] = &[
    ("metadata", try_metadata),
    ("bookmark", try_first_bookmark),
    ("first-page", try_first_page_run),
    ("font-scan", try_font_scan),
];

/// Resolves the document title, or an empty string when no candidate
/// survives the gate.
pub fn resolve_title(doc: &dyn DocumentHandle, config: &ExtractionConfig) -> String {
    for (name, strategy) in STRATEGIES {
        let Some(raw) = strategy(doc, config) else {
            continue;
        };
        let candidate = clean_text(&raw);
        if is_plausible_title(&candidate, config) {
            tracing::debug!(strategy = name, title = %candidate, "title resolved");
            return candidate;
        }
        tracing::debug!(strategy = name, candidate = %candidate, "title candidate rejected");
    }
    String::new()
}

// === Strategy 1: metadata title ===

/// The `/Title` entry of the document information dictionary. Writers
/// frequently stamp the source filename or an application placeholder
/// here, so those are rejected before the candidate reaches the gate.
fn try_metadata(doc: &dyn DocumentHandle, _config: &ExtractionConfig) -> Option<String> {
    let raw = doc.metadata_title()?.trim();
    if raw.is_empty() {
        return None;
    }

    static GENERATED_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^(microsoft (word|powerpoint|excel)\s*-|untitled\b|document\d*$|presentation\d*$)")
            .unwrap()
    });
    if GENERATED_RE.is_match(raw) {
        return None;
    }

    if let Some(stem) = doc.file_stem() {
        if is_filename_echo(&raw.to_lowercase(), &stem.to_lowercase()) {
            return None;
        }
    }
    Some(raw.to_string())
}

/// True when the metadata title is just the filename, with or without an
/// extension ("report", "report.pdf", "report.docx").
fn is_filename_echo(candidate: &str, stem: &str) -> bool {
    if candidate == stem {
        return true;
    }
    match candidate.strip_prefix(stem) {
        Some(rest) => {
            static EXTENSION_RE: Lazy<Regex> =
                Lazy::new(|| Regex::new(r"^\.[a-z0-9]{1,5}$").unwrap());
            EXTENSION_RE.is_match(rest)
        }
        None => false,
    }
}

// === Strategy 2: first top-level bookmark ===

/// Bookmark trees covering a single work usually put its name at the
/// root, so the first minimum-depth entry is a decent stand-in.
fn try_first_bookmark(doc: &dyn DocumentHandle, _config: &ExtractionConfig) -> Option<String> {
    let bookmarks = doc.bookmarks();
    let min_depth = bookmarks.iter().map(|b| b.depth).min()?;
    bookmarks
        .iter()
        .find(|b| b.depth == min_depth)
        .map(|b| b.title.clone())
}

// === Strategy 3: largest run on the first page ===

fn try_first_page_run(doc: &dyn DocumentHandle, config: &ExtractionConfig) -> Option<String> {
    largest_run_on_page(doc, 0, config, true)
}

// === Strategy 4: relaxed scan of the opening pages ===

/// Fallback for covers that bury the title in artwork or start the text
/// a few pages in: the band exclusion is dropped and later pages are
/// considered, first plausible run wins.
fn try_font_scan(doc: &dyn DocumentHandle, config: &ExtractionConfig) -> Option<String> {
    let pages = doc.page_count().min(config.max_pages_for_analysis);
    for page_index in 0..pages {
        let Some(run) = largest_run_on_page(doc, page_index, config, false) else {
            continue;
        };
        if is_plausible_title(&clean_text(&run), config) {
            return Some(run);
        }
    }
    None
}

/// The concatenated run of spans sharing the page's largest font size on
/// one visual line, left to right. With `exclude_bands` set, spans inside
/// the header and footer bands are ignored first.
fn largest_run_on_page(
    doc: &dyn DocumentHandle,
    page_index: usize,
    config: &ExtractionConfig,
    exclude_bands: bool,
) -> Option<String> {
    let spans = doc.spans(page_index).ok()?;
    let height = doc.page_height(page_index);
    let header_cutoff = height * config.header_band_ratio;
    let footer_cutoff = height * (1.0 - config.footer_band_ratio);

    let eligible: Vec<&Span> = spans
        .iter()
        .filter(|s| !s.text.trim().is_empty())
        .filter(|s| !exclude_bands || (s.y >= header_cutoff && s.y <= footer_cutoff))
        .collect();

    let max_size = eligible.iter().map(|s| s.font_size).fold(f32::MIN, f32::max);
    if max_size <= 0.0 {
        return None;
    }

    // The topmost maximal-size span anchors the line.
    let anchor = eligible
        .iter()
        .filter(|s| same_size(s.font_size, max_size))
        .min_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)))?;

    let mut run: Vec<&Span> = eligible
        .iter()
        .filter(|s| same_size(s.font_size, max_size) && (s.y - anchor.y).abs() < max_size * 0.5)
        .copied()
        .collect();
    run.sort_by(|a, b| a.x.total_cmp(&b.x));

    Some(
        run.iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Shared gate: length bounds, at least one alphabetic character, and
/// not a known boilerplate stamp.
fn is_plausible_title(candidate: &str, config: &ExtractionConfig) -> bool {
    let length = candidate.chars().count();
    if length < config.title_min_length || length > config.title_max_length {
        return false;
    }
    if !candidate.chars().any(|c| c.is_alphabetic()) {
        return false;
    }
    let lowered = candidate.to_lowercase();
    !config.boilerplate_titles.iter().any(|b| *b == lowered)
}
