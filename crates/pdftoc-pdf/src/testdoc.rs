//! Scripted in-memory documents for heuristic tests.

use pdftoc_core::{BackendError, Bookmark, DocumentHandle, Span};

pub(crate) struct FakeDoc {
    pages: Vec<Vec<Span>>,
    bookmarks: Vec<Bookmark>,
    metadata_title: Option<String>,
    file_stem: Option<String>,
    page_height: f32,
}

impl FakeDoc {
    pub(crate) fn new(pages: Vec<Vec<Span>>) -> Self {
        FakeDoc {
            pages,
            bookmarks: Vec::new(),
            metadata_title: None,
            file_stem: None,
            page_height: 792.0,
        }
    }

    pub(crate) fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub(crate) fn with_metadata_title(mut self, title: &str) -> Self {
        self.metadata_title = Some(title.to_string());
        self
    }

    pub(crate) fn with_file_stem(mut self, stem: &str) -> Self {
        self.file_stem = Some(stem.to_string());
        self
    }

    pub(crate) fn with_bookmarks(mut self, bookmarks: Vec<Bookmark>) -> Self {
        self.bookmarks = bookmarks;
        self
    }
}

impl DocumentHandle for FakeDoc {
    fn page_count(&self) -> usize {
        self.pages.len()
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
        self.pages
            .get(page_index)
            .cloned()
            .ok_or(BackendError::PageOutOfRange {
                page: page_index,
                pages: self.pages.len(),
            })
    }

    fn page_height(&self, _page_index: usize) -> f32 {
        self.page_height
    }
}

pub(crate) fn span(text: &str, size: f32, x: f32, y: f32) -> Span {
    Span {
        text: text.to_string(),
        font_size: size,
        bold: false,
        x,
        y,
    }
}

pub(crate) fn bold_span(text: &str, size: f32, x: f32, y: f32) -> Span {
    Span {
        bold: true,
        ..span(text, size, x, y)
    }
}

pub(crate) fn bookmark(title: &str, depth: usize, page: Option<u32>) -> Bookmark {
    Bookmark {
        title: title.to_string(),
        depth,
        page,
    }
}
