//! Error types for theme detection.
//!
//! None of these errors escape a detector's public operations. Sampling
//! failures collapse to [`ThemeState::Light`](crate::ThemeState::Light),
//! listener failures are isolated per listener, and monitor failures end the
//! background loop until the next listener registration restarts it.

use std::time::Duration;

/// Result type alias for detector setup operations.
pub type Result<T> = std::result::Result<T, DetectorError>;

/// Platform or version probing failed.
///
/// Probe errors are always resolved to "no match" during detector selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    /// The version string reported by the OS could not be parsed.
    #[error("unparsable OS version '{0}'")]
    InvalidVersion(String),
}

/// A single instantaneous theme read failed.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// The helper process could not be started.
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the helper process output failed.
    #[error("failed to read output of '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The helper process did not finish in time and was killed.
    #[error("'{command}' did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    /// The helper process exited unsuccessfully.
    #[error("'{command}' exited with {status}")]
    CommandFailed { command: String, status: String },

    /// A native API call failed.
    #[error("native theme query failed: {0}")]
    Native(String),
}

impl SampleError {
    /// Create a spawn error.
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Create an I/O error.
    pub fn io(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            command: command.into(),
            source,
        }
    }

    /// Create a timeout error.
    pub fn timeout(command: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            command: command.into(),
            timeout,
        }
    }

    /// Returns true if the helper command could not be started.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}

/// The background watcher could not be established or died irrecoverably.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The change-notification primitive could not be set up.
    #[error("failed to establish change notification: {0}")]
    Establish(String),

    /// The monitor thread could not be spawned.
    #[error("failed to spawn monitor thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The monitoring stream ended or failed.
    #[error("monitoring stream failed: {0}")]
    Stream(String),

    /// A native wait primitive failed.
    #[error("native change wait failed: {0}")]
    Native(String),
}

impl MonitorError {
    /// Create an establish error.
    pub fn establish(message: impl Into<String>) -> Self {
        Self::Establish(message.into())
    }

    /// Create a stream error.
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream(message.into())
    }

    /// Create a native error.
    pub fn native(message: impl Into<String>) -> Self {
        Self::Native(message.into())
    }
}

/// A listener panicked while handling a theme change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("listener panicked: {message}")]
pub struct ListenerError {
    /// The panic payload, if it was a string.
    pub message: String,
}

impl ListenerError {
    /// Build from a `catch_unwind` payload.
    pub fn from_panic(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "<non-string panic payload>".to_string()
        };
        Self { message }
    }
}

/// The umbrella error type for theme detection setup.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// The process-wide detector has already been created.
    #[error("the process-wide theme detector has already been initialized")]
    AlreadyInitialized,

    /// A theme name pattern failed to compile.
    #[error("invalid theme pattern: {0}")]
    InvalidPattern(String),

    /// Monitor error.
    #[error(transparent)]
    Monitor(#[from] MonitorError),
}
