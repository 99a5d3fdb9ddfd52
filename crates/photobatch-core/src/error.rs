//! Batch error taxonomy
//!
//! All batch errors are unified under the `AppError` enum. Each variant maps to a
//! stable machine-readable kind (see [`ErrorMetadata::error_code`]) so callers can
//! embed failures into per-folder outcomes without losing their category.

use std::io;

/// Level at which a failure is logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected rejections such as bad codes
    Debug,
    /// A single folder failed, the batch goes on
    Warn,
    /// Store outages and bugs
    Error,
}

/// How an error is classified when it ends up in a report
pub trait ErrorMetadata {
    /// HTTP status code an outer route layer should return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same folder may succeed
    fn is_recoverable(&self) -> bool;

    /// Message safe to put in a folder outcome
    fn client_message(&self) -> String;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed codes, empty batch: rejects the whole batch before any I/O.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A required remote ancestor folder is missing or unresolvable.
    #[error("Folder structure error: {0}")]
    FolderStructure(String),

    /// Staging, conversion or rename failure.
    #[error("Processing error: {0}")]
    Processing(String),

    /// Upload, download or create call failed on the remote store.
    #[error("Remote store error: {0}")]
    RemoteStore(String),

    #[error("Batch cancelled before folder '{0}' started")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Processing(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::Validation(_) => (400, "VALIDATION_ERROR", false, LogLevel::Debug),
        AppError::FolderStructure(_) => (404, "FOLDER_STRUCTURE_ERROR", true, LogLevel::Warn),
        AppError::Processing(_) => (500, "PROCESSING_ERROR", false, LogLevel::Warn),
        AppError::RemoteStore(_) => (502, "REMOTE_STORE_ERROR", true, LogLevel::Error),
        AppError::Cancelled(_) => (409, "CANCELLED", true, LogLevel::Debug),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", true, LogLevel::Error)
        }
    }
}

impl AppError {
    /// Display text followed by the `source()` chain, for logs.
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Validation(ref msg)
            | AppError::FolderStructure(ref msg)
            | AppError::Processing(ref msg)
            | AppError::RemoteStore(ref msg) => msg.clone(),
            AppError::Cancelled(ref folder) => {
                format!("Batch cancelled before folder '{}' started", folder)
            }
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_validation() {
        let err = AppError::Validation("Invalid codes: X1".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Invalid codes: X1");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_remote_store() {
        let err = AppError::RemoteStore("upload failed".to_string());
        assert_eq!(err.error_code(), "REMOTE_STORE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_internal_hides_details() {
        let err = AppError::Internal("secret path /tmp/x".to_string());
        assert_eq!(err.client_message(), "Internal error");
        assert_eq!(err.error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_io_error_maps_to_processing() {
        let err: AppError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.error_code(), "PROCESSING_ERROR");
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let err: AppError = anyhow::anyhow!("root cause").context("outer").into();
        let details = err.detailed_message();
        assert!(details.contains("Internal error with source"));
        assert!(details.contains("Caused by: outer"));
    }
}
