//! Detector configuration.

use std::time::Duration;

/// Default pause between samples for polling monitors.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default upper bound on a single blocking wait before the stop flag is re-checked.
pub const DEFAULT_STOP_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Default bound on a single subprocess-based sample.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Configuration shared by every detector variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Pause between samples for pure polling monitors.
    pub poll_interval: Duration,
    /// Maximum time a blocking wait may run before the stop flag is checked.
    pub stop_check_interval: Duration,
    /// Time limit for one subprocess-based sample.
    pub command_timeout: Duration,
    /// Monitor thread name. `None` uses the platform's default name.
    pub thread_name: Option<String>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            stop_check_interval: DEFAULT_STOP_CHECK_INTERVAL,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            thread_name: None,
        }
    }
}

impl DetectorConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the polling interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the stop-check interval.
    pub fn stop_check_interval(mut self, interval: Duration) -> Self {
        self.stop_check_interval = interval;
        self
    }

    /// Set the subprocess timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Override the monitor thread name.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    /// The configured thread name, or `default` when none was set.
    pub fn thread_name_or(&self, default: &str) -> String {
        self.thread_name
            .clone()
            .unwrap_or_else(|| default.to_string())
    }
}
