//! Configuration for find sessions.

use std::time::Duration;

/// Delay between the last keystroke and the search it triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Find session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindConfig {
    /// How long a live-typing search waits before it runs.
    pub debounce: Duration,

    /// Send match counts while pages are still being processed.
    ///
    /// When disabled, state and count notifications are held back until
    /// every page has been visited and a single final count is sent.
    pub report_progress: bool,
}

impl Default for FindConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FindConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            report_progress: true,
        }
    }

    /// Set the live-typing debounce delay.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Enable or disable progressive count reporting.
    pub fn with_report_progress(mut self, enable: bool) -> Self {
        self.report_progress = enable;
        self
    }
}
