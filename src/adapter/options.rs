//! Extraction options and configuration.

use crate::error::{Error, Result};
use std::time::{Duration, Instant};

/// Options for running a format adapter.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode for unreadable pages or slides
    pub error_mode: ErrorMode,

    /// Whether to process PDF pages in parallel
    pub parallel: bool,

    /// Time limit for a single adapter call
    pub timeout: Option<Duration>,

    /// Maximum number of pages or slides to read (0 = unlimited)
    pub max_pages: u32,

    /// Cooperative deadline derived from `timeout` when the call starts
    pub(crate) deadline: Option<Instant>,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip unreadable pages).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Bound every adapter call by a time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Limit the number of pages or slides read.
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Copy of these options with the deadline armed from now.
    pub(crate) fn armed(&self) -> Self {
        let mut armed = self.clone();
        armed.deadline = self.timeout.map(|t| Instant::now() + t);
        armed
    }

    /// Fail with [`Error::ExtractionTimeout`] once the deadline has passed.
    ///
    /// Adapters call this between pages and slides.
    pub fn check_deadline(&self) -> Result<()> {
        match (self.deadline, self.timeout) {
            (Some(deadline), Some(timeout)) if Instant::now() >= deadline => {
                Err(Error::ExtractionTimeout {
                    limit_ms: timeout.as_millis() as u64,
                })
            }
            _ => Ok(()),
        }
    }

    /// Whether page `n` (1-based) is within `max_pages`.
    pub fn includes_page(&self, n: u32) -> bool {
        self.max_pages == 0 || n <= self.max_pages
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            parallel: true,
            timeout: None,
            max_pages: 0,
            deadline: None,
        }
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any unreadable page
    #[default]
    Strict,
    /// Skip unreadable pages and continue
    Lenient,
}
