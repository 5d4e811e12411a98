//! Error types for the find engine.
//!
//! Nothing in this crate is fatal to the host: every variant here is either
//! recovered locally (an extraction failure degrades to an empty page) or
//! reported to the caller of an explicit operation.

/// Result type alias for find operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while searching a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Page text could not be extracted; the page is searched as if empty.
    #[error("Unable to get text content for page {page}: {reason}")]
    Extraction {
        /// Zero-based page index
        page: usize,
        /// Reason reported by the text source
        reason: String,
    },

    /// A scan tried to pause on a page while another pause was pending.
    #[error("There can only be one pending page (already waiting on page {page})")]
    ScanAlreadyPending {
        /// Page the existing resume point waits on
        page: usize,
    },

    /// The query produced a pattern the regex engine rejected.
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(String),

    /// A page index outside the document was supplied.
    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange {
        /// Offending page index
        page: usize,
        /// Number of pages in the document
        page_count: usize,
    },

    /// The find controller task has stopped.
    #[error("Find controller is no longer running")]
    ControllerClosed,
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::InvalidPattern(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_error() {
        let err = Error::Extraction {
            page: 3,
            reason: "stream truncated".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("page 3"));
        assert!(msg.contains("stream truncated"));
    }

    #[test]
    fn test_scan_already_pending_error() {
        let err = Error::ScanAlreadyPending { page: 7 };
        assert!(format!("{}", err).contains("one pending page"));
    }

    #[test]
    fn test_page_out_of_range_error() {
        let err = Error::PageOutOfRange {
            page: 12,
            page_count: 4,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("12"));
        assert!(msg.contains("4 pages"));
    }

    #[test]
    fn test_regex_error_conversion() {
        let err: Error = regex::Regex::new("(").unwrap_err().into();
        assert!(matches!(err, Error::InvalidPattern(_)));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
