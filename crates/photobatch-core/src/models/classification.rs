use serde::Serialize;

use super::country::CountryCode;

/// Why a file was rejected, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    NotAnImage,
    MalformedPtSuffix,
    MissingMarker,
}

impl InvalidReason {
    pub fn message(self) -> &'static str {
        match self {
            InvalidReason::NotAnImage => "Not an image file",
            InvalidReason::MalformedPtSuffix => {
                "Malformed .PT suffix (must be exactly 2 digits, e.g. .PT01)"
            }
            InvalidReason::MissingMarker => "Name must contain .PT or .MAIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidFile {
    pub name: String,
    pub reason: InvalidReason,
}

/// Classification of one submitted folder. Purely computed; recomputing it on
/// the same input yields the same result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub country: Option<CountryCode>,
    pub color: String,
    pub valid_files: Vec<String>,
    pub invalid_files: Vec<InvalidFile>,
    /// Valid files that will be converted from PNG
    pub png_count: usize,
    /// Files submitted, including skipped housekeeping files
    pub total_files: usize,
}

impl ClassificationResult {
    pub fn is_clean(&self) -> bool {
        self.invalid_files.is_empty()
    }
}

/// One staged output: `output_name` is `<code><logical extension of source>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenameTarget {
    pub source_name: String,
    pub output_name: String,
}
