//! Error types for the report pipeline.
//!
//! Hard failures (`Input` escalating to `NoData`, configuration and I/O
//! problems) are [`ReportError`] values and abort the run before any
//! artifact is written. Soft conditions such as an empty statistics scope
//! or a single-sample bucket are not errors: they travel through the
//! pipeline as `None` values that every consumer has to check.

use std::path::PathBuf;
use std::time::Duration;

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Error type for the report pipeline
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// A source file is missing, unreadable, or structurally too narrow.
    /// The loader skips such sources; this only escapes when a single
    /// source is read directly.
    #[error("Input error in {}: {message}", path.display())]
    Input { path: PathBuf, message: String },

    /// No valid samples remained after cleaning and merging every source.
    #[error("No valid samples in {} source(s) after cleaning", sources)]
    NoData { sources: usize },

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Writing or reading an artifact failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A render adapter rejected the finished layout.
    #[error("Render error: {0}")]
    Render(String),

    /// The external device download step failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ReportError {
    /// Create an input error for a source path.
    pub fn input(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Input {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error is fatal to the whole run.
    ///
    /// Only `Input` errors are recoverable, by skipping the source.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Input { .. })
    }
}

/// Errors from the external device download collaborator.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to start downloader for device '{device}': {source}")]
    Spawn {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Downloader for device '{device}' timed out after {timeout:?}")]
    Timeout { device: String, timeout: Duration },

    #[error("Downloader for device '{device}' exited with {status}")]
    Failed { device: String, status: String },

    #[error("Downloader for device '{device}' produced no file at {}", path.display())]
    MissingOutput { device: String, path: PathBuf },

    #[error("I/O error while collecting download for device '{device}': {source}")]
    Io {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown device '{0}'")]
    UnknownDevice(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_is_not_fatal() {
        let err = ReportError::input("a.csv", "less than 4 columns");
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("a.csv"));
        assert!(err.to_string().contains("less than 4 columns"));
    }

    #[test]
    fn test_no_data_is_fatal() {
        let err = ReportError::NoData { sources: 2 };
        assert!(err.is_fatal());
        assert_eq!(
            err.to_string(),
            "No valid samples in 2 source(s) after cleaning"
        );
    }

    #[test]
    fn test_fetch_error_converts() {
        let err: ReportError = FetchError::UnknownDevice("M9".to_string()).into();
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Unknown device 'M9'");
    }
}
