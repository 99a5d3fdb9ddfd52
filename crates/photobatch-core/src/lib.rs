//! Photobatch Core Library
//!
//! This crate provides the domain models, the folder/file naming grammar, error
//! types and configuration shared by every photobatch component.

pub mod config;
pub mod error;
pub mod grammar;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, RemoteRoot};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    AnalysisReport, AnalysisSummary, BatchReport, ClassificationResult, CodeValidation,
    CountryCode, FolderAnalysis, FolderOutcome, FolderStats, FolderSubmission, InvalidFile,
    InvalidReason, OutcomeError, ProductCode, RenameTarget, UploadBatch, UploadedFile,
};
pub use storage_types::StoreBackend;
