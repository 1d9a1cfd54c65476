use std::path::Path;

use thiserror::Error;

/// Errors that can occur while opening or reading a PDF.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("document is encrypted")]
    Encrypted,
    #[error("failed to read page content: {0}")]
    ParseError(String),
    #[error("page {page} out of range ({pages} pages)")]
    PageOutOfRange { page: usize, pages: usize },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One run of text on a page, with enough geometry and styling to
/// support heading heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub font_size: f32,
    pub bold: bool,
    /// Left edge, in page units.
    pub x: f32,
    /// Distance from the top edge of the page, increasing downward.
    pub y: f32,
}

/// One node of the document's bookmark tree, flattened in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Bookmark {
    pub title: String,
    /// Nesting depth in the source tree, 1 = top level.
    pub depth: usize,
    /// 1-based destination page, `None` when the target could not be resolved.
    pub page: Option<u32>,
}

/// Read access to one opened document.
///
/// Handles are created and dropped inside a single worker task and are
/// deliberately not required to be `Send`.
pub trait DocumentHandle {
    fn page_count(&self) -> usize;

    /// Stem of the file the document was opened from, used to reject
    /// metadata titles that merely echo the filename.
    fn file_stem(&self) -> Option<&str>;

    /// The `/Title` entry of the document information dictionary, if any.
    fn metadata_title(&self) -> Option<&str>;

    /// The bookmark tree flattened in document order. Empty when the
    /// document has no bookmarks or they could not be read.
    fn bookmarks(&self) -> &[Bookmark];

    /// Text spans of one page (0-based), in reading order.
    fn spans(&self, page_index: usize) -> Result<Vec<Span>, BackendError>;

    /// Height of one page (0-based) in page units.
    fn page_height(&self, page_index: usize) -> f32;
}

/// Trait for PDF parsing backends.
pub trait DocumentOpener: Send + Sync {
    /// Open the document at `path` for structure extraction.
    fn open(&self, path: &Path) -> Result<Box<dyn DocumentHandle>, BackendError>;
}
