use serde::Serialize;

use crate::error::{AppError, ErrorMetadata};

/// Machine-readable kind plus human-readable message of a folder failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutcomeError {
    pub kind: String,
    pub message: String,
}

impl From<&AppError> for OutcomeError {
    fn from(err: &AppError) -> Self {
        OutcomeError {
            kind: err.error_code().to_string(),
            message: err.client_message(),
        }
    }
}

/// Terminal record for one folder. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderOutcome {
    pub folder_name: String,
    pub success: bool,
    pub files_generated: usize,
    pub files_uploaded: usize,
    pub png_converted: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<OutcomeError>,
}

impl FolderOutcome {
    pub fn succeeded(
        folder_name: impl Into<String>,
        files_generated: usize,
        files_uploaded: usize,
        png_converted: usize,
    ) -> Self {
        FolderOutcome {
            folder_name: folder_name.into(),
            success: true,
            files_generated,
            files_uploaded,
            png_converted,
            error: None,
        }
    }

    pub fn failed(folder_name: impl Into<String>, err: &AppError) -> Self {
        FolderOutcome {
            folder_name: folder_name.into(),
            success: false,
            files_generated: 0,
            files_uploaded: 0,
            png_converted: 0,
            error: Some(OutcomeError::from(err)),
        }
    }
}

/// Result of a processing call. `success` reports that the batch ran; folder
/// failures live inside `results`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub success: bool,
    pub results: Vec<FolderOutcome>,
    pub total: usize,
    pub succeeded: usize,
}

impl BatchReport {
    pub fn from_outcomes(results: Vec<FolderOutcome>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        BatchReport {
            success: true,
            total: results.len(),
            succeeded,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_outcome_carries_kind() {
        let err = AppError::FolderStructure("missing FOTOS".to_string());
        let outcome = FolderOutcome::failed("RED ES", &err);
        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert_eq!(error.kind, "FOLDER_STRUCTURE_ERROR");
        assert_eq!(error.message, "missing FOTOS");
    }

    #[test]
    fn test_report_counts() {
        let report = BatchReport::from_outcomes(vec![
            FolderOutcome::succeeded("A ES", 2, 3, 0),
            FolderOutcome::failed("B", &AppError::Processing("bad".to_string())),
        ]);
        assert!(report.success);
        assert_eq!(report.total, 2);
        assert_eq!(report.succeeded, 1);
    }
}
