//! MuPDF-backed implementation of [`DocumentOpener`].
//!
//! MuPDF provides the text layer: spans with geometry and font sizes.
//! The cold structure, meaning the information dictionary and the
//! outline tree, is read once at open time by lopdf. A lopdf failure
//! other than encryption degrades to a document without metadata or
//! bookmarks instead of failing the open, since files with damaged
//! cross-reference tables are often still readable by MuPDF's repair
//! pass.
//!
//! This crate is the sole AGPL island: it isolates the mupdf dependency
//! (which is AGPL-3.0) so that non-PDF code paths do not transitively
//! depend on it.

mod structure;

use std::path::Path;

use mupdf::{Document, TextPageFlags};

use pdftoc_core::{BackendError, Bookmark, DocumentHandle, DocumentOpener, Span};

/// Stand-in page height when a page's bounds cannot be read (US Letter).
const FALLBACK_PAGE_HEIGHT: f32 = 792.0;

/// MuPDF-based implementation of [`DocumentOpener`].
#[derive(Default)]
pub struct MupdfOpener;

impl MupdfOpener {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentOpener for MupdfOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>, BackendError> {
        Ok(Box::new(MupdfDocument::open(path)?))
    }
}

/// One opened document. Text access goes through MuPDF on demand,
/// structure was captured once at open time.
pub struct MupdfDocument {
    document: Document,
    page_count: usize,
    file_stem: Option<String>,
    metadata_title: Option<String>,
    bookmarks: Vec<Bookmark>,
}

impl MupdfDocument {
    pub fn open(path: &Path) -> Result<Self, BackendError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        // Structure pass. Encryption is fatal, anything else degrades.
        let (metadata_title, bookmarks) = match lopdf::Document::load(path) {
            Ok(doc) => (structure::info_title(&doc), structure::bookmarks(&doc)),
            Err(lopdf::Error::Decryption(_)) => return Err(BackendError::Encrypted),
            Err(e) => {
                tracing::debug!(error = %e, "structure pass failed, continuing without metadata");
                (None, Vec::new())
            }
        };

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;
        let page_count = document
            .page_count()
            .map_err(|e| BackendError::OpenError(e.to_string()))?
            .max(0) as usize;

        let file_stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());

        Ok(Self {
            document,
            page_count,
            file_stem,
            metadata_title,
            bookmarks,
        })
    }
}

impl DocumentHandle for MupdfDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn file_stem(&self) -> Option<&str> {
        self.file_stem.as_deref()
    }

    fn metadata_title(&self) -> Option<&str> {
        self.metadata_title.as_deref()
    }

    fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    fn spans(&self, page_index: usize) -> Result<Vec<Span>, BackendError> {
        if page_index >= self.page_count {
            return Err(BackendError::PageOutOfRange {
                page: page_index,
                pages: self.page_count,
            });
        }

        let page = self
            .document
            .load_page(page_index as i32)
            .map_err(|e| BackendError::ParseError(e.to_string()))?;
        let text_page = page
            .to_text_page(TextPageFlags::empty())
            .map_err(|e| BackendError::ParseError(e.to_string()))?;

        let mut spans = Vec::new();
        for block in text_page.blocks() {
            for line in block.lines() {
                let bounds = line.bounds();
                let mut text = String::new();
                let mut font_size = 0.0f32;
                for ch in line.chars() {
                    if let Some(c) = ch.char() {
                        text.push(c);
                    }
                    font_size = font_size.max(ch.size());
                }
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if font_size <= 0.0 {
                    // Scanned or synthetic text sometimes carries no glyph
                    // size. The line box height is a serviceable stand-in.
                    font_size = bounds.y1 - bounds.y0;
                }
                spans.push(Span {
                    text: trimmed.to_string(),
                    font_size,
                    // MuPDF's text page does not expose font weight flags.
                    bold: false,
                    x: bounds.x0,
                    y: bounds.y0,
                });
            }
        }
        Ok(spans)
    }

    fn page_height(&self, page_index: usize) -> f32 {
        self.document
            .load_page(page_index as i32)
            .and_then(|page| page.bounds())
            .map(|bounds| bounds.y1 - bounds.y0)
            .unwrap_or(FALLBACK_PAGE_HEIGHT)
    }
}
