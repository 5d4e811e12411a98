//! Page text providers.
//!
//! The find engine does not parse documents. Whatever renders the document
//! implements [`PageTextSource`] and hands over each page's text in reading
//! order, with `'\n'` where a line ends.

use std::future::Future;

use crate::error::{Error, Result};

/// Separator between pages in plain-text dumps (form feed).
pub const PAGE_SEPARATOR: char = '\u{000C}';

/// Asynchronous access to the text of a document's pages.
pub trait PageTextSource: Send + Sync + 'static {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Extract the text of one page.
    ///
    /// Failures are not fatal: the page is searched as if it were empty.
    fn extract_page_text(&self, page_index: usize)
        -> impl Future<Output = Result<String>> + Send;
}

/// Pages held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticPages {
    pages: Vec<String>,
}

impl StaticPages {
    /// Create a source from page texts.
    pub fn new<I, T>(pages: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a text dump into pages at form feeds.
    ///
    /// A trailing form feed does not start an extra page.
    pub fn from_form_feeds(text: &str) -> Self {
        let text = text.strip_suffix(PAGE_SEPARATOR).unwrap_or(text);
        if text.is_empty() {
            return Self::default();
        }
        Self::new(text.split(PAGE_SEPARATOR))
    }

    /// Text of a page.
    pub fn page(&self, page_index: usize) -> Option<&str> {
        self.pages.get(page_index).map(String::as_str)
    }
}

impl PageTextSource for StaticPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_page_text(&self, page_index: usize) -> impl Future<Output = Result<String>> + Send {
        let text = self
            .pages
            .get(page_index)
            .cloned()
            .ok_or(Error::PageOutOfRange {
                page: page_index,
                page_count: self.pages.len(),
            });
        std::future::ready(text)
    }
}
