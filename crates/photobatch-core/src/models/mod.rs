//! Domain models
//!
//! Batch input (folders and their uploaded files), classification results,
//! per-folder outcomes and preview reports.

pub mod analysis;
pub mod batch;
pub mod classification;
pub mod code;
pub mod country;
pub mod outcome;

pub use analysis::{AnalysisReport, AnalysisSummary, FolderAnalysis, FolderStats};
pub use batch::{FolderSubmission, UploadBatch, UploadedFile};
pub use classification::{ClassificationResult, InvalidFile, InvalidReason, RenameTarget};
pub use code::{CodeValidation, ProductCode};
pub use country::CountryCode;
pub use outcome::{BatchReport, FolderOutcome, OutcomeError};
