use std::path::Path;
use std::sync::Arc;

use pdftoc_core::{DocumentOpener, DocumentProcessor, PipelineError};

pub mod config;
mod outline;
mod text;
mod title;

#[cfg(test)]
pub(crate) mod testdoc;

pub use config::{ExtractionConfig, ExtractionConfigBuilder, InvalidConfig, ListOverride};
pub use outline::resolve_outline;
pub use title::resolve_title;

// Re-export domain types from core (canonical definitions live there)
pub use pdftoc_core::{
    DocumentHandle, ExtractionResult, HeadingLevel, OutlineEntry, ValidationOutcome,
};

/// Extracts and validates the structure of one opened document:
///
/// 1. Title resolution (metadata, bookmarks, layout heuristics)
/// 2. Outline resolution (bookmarks, content patterns)
/// 3. Schema validation of the combined record
pub fn extract_structure(
    doc: &dyn DocumentHandle,
    config: &ExtractionConfig,
) -> ValidationOutcome {
    let title = title::resolve_title(doc, config);
    let outline = outline::resolve_outline(doc, config);
    let candidate = ExtractionResult { title, outline };
    pdftoc_core::validate(candidate, doc.page_count(), &config.validation_limits())
}

pub(crate) fn same_size(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.1
}

/// Per-document pipeline wired to a concrete parsing backend. This is
/// what the batch orchestrator runs for every file.
pub struct StructureExtractor {
    opener: Arc<dyn DocumentOpener>,
    config: ExtractionConfig,
}

impl StructureExtractor {
    pub fn new(opener: Arc<dyn DocumentOpener>, config: ExtractionConfig) -> Self {
        StructureExtractor { opener, config }
    }
}

impl DocumentProcessor for StructureExtractor {
    fn process(&self, path: &Path) -> Result<ValidationOutcome, PipelineError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _span = tracing::info_span!("document", file = %filename).entered();
        let doc = self.opener.open(path)?;
        Ok(extract_structure(doc.as_ref(), &self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdoc::{FakeDoc, bookmark, span};
    use pdftoc_core::BackendError;

    #[test]
    fn bare_report_page_yields_title_and_no_outline() {
        // Single page, no metadata, no bookmarks: one big line over body
        // text. The line is the title and nothing qualifies as a heading.
        let doc = FakeDoc::new(vec![vec![
            span("Annual Report 2024", 24.0, 160.0, 120.0),
            span("The fiscal year closed with revenue broadly flat", 12.0, 72.0, 300.0),
            span("against the prior period, as detailed below.", 12.0, 72.0, 316.0),
        ]]);
        let outcome = extract_structure(&doc, &ExtractionConfig::default());
        assert_eq!(outcome.result.title, "Annual Report 2024");
        assert!(outcome.result.outline.is_empty());
        assert!(outcome.sanitizations.is_empty());
    }

    #[test]
    fn metadata_and_bookmarks_fill_their_own_fields() {
        let doc = FakeDoc::new(vec![Vec::new()])
            .with_metadata_title("Intro Doc")
            .with_bookmarks(vec![
                bookmark("Introduction", 1, Some(1)),
                bookmark("Background", 2, Some(1)),
            ]);
        let outcome = extract_structure(&doc, &ExtractionConfig::default());
        assert_eq!(outcome.result.title, "Intro Doc");
        let flat: Vec<(HeadingLevel, &str, u32)> = outcome
            .result
            .outline
            .iter()
            .map(|e| (e.level, e.text.as_str(), e.page))
            .collect();
        assert_eq!(
            flat,
            vec![
                (HeadingLevel::H1, "Introduction", 1),
                (HeadingLevel::H2, "Background", 1),
            ],
        );
    }

    #[test]
    fn extraction_is_deterministic_for_identical_input() {
        let build = || {
            FakeDoc::new(vec![vec![
                span("1 Overview", 12.0, 72.0, 100.0),
                span("A paragraph of ordinary body text sits here.", 12.0, 72.0, 200.0),
                span("1.1 Scope", 12.0, 72.0, 300.0),
            ]])
            .with_metadata_title("Stable Output")
        };
        let first = extract_structure(&build(), &ExtractionConfig::default());
        let second = extract_structure(&build(), &ExtractionConfig::default());
        assert_eq!(
            serde_json::to_string(&first.result).unwrap(),
            serde_json::to_string(&second.result).unwrap(),
        );
    }

    #[test]
    fn extract_structure_combines_title_outline_and_validation() {
        let doc = FakeDoc::new(vec![Vec::new(); 3])
            .with_metadata_title("Systems Security Primer")
            .with_bookmarks(vec![
                bookmark("Threat Models", 1, Some(1)),
                bookmark("Appendix Z", 1, Some(12)),
            ]);
        let outcome = extract_structure(&doc, &ExtractionConfig::default());
        assert_eq!(outcome.result.title, "Systems Security Primer");
        assert_eq!(outcome.result.outline.len(), 1);
        assert_eq!(outcome.result.outline[0].text, "Threat Models");
        // The bookmark pointing past the last page was dropped, audibly.
        assert_eq!(outcome.sanitizations.len(), 1);
        assert!(outcome.sanitizations[0].contains("exceeds page count 3"));
    }

    #[test]
    fn processor_runs_the_full_pipeline() {
        struct CannedOpener;
        impl DocumentOpener for CannedOpener {
            fn open(
                &self,
                _path: &Path,
            ) -> Result<Box<dyn DocumentHandle>, BackendError> {
                Ok(Box::new(
                    FakeDoc::new(vec![Vec::new()]).with_metadata_title("Canned Document"),
                ))
            }
        }
        let extractor = StructureExtractor::new(Arc::new(CannedOpener), ExtractionConfig::default());
        let outcome = extractor.process(Path::new("canned.pdf")).unwrap();
        assert_eq!(outcome.result.title, "Canned Document");
        assert!(outcome.result.outline.is_empty());
    }

    #[test]
    fn processor_propagates_open_failures() {
        struct FailingOpener;
        impl DocumentOpener for FailingOpener {
            fn open(
                &self,
                _path: &Path,
            ) -> Result<Box<dyn DocumentHandle>, BackendError> {
                Err(BackendError::OpenError("startxref not found".to_string()))
            }
        }
        let extractor = StructureExtractor::new(Arc::new(FailingOpener), ExtractionConfig::default());
        let error = extractor.process(Path::new("x.pdf")).unwrap_err();
        assert!(
            error.to_string().contains("failed to open PDF"),
            "got: {error}",
        );
    }
}
