use serde::Serialize;

use super::classification::{ClassificationResult, InvalidFile};
use super::code::CodeValidation;
use super::country::CountryCode;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FolderStats {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
    pub pngs_to_convert: usize,
}

/// Dry-run view of one folder.
#[derive(Debug, Clone, Serialize)]
pub struct FolderAnalysis {
    pub name: String,
    pub detected_country: Option<CountryCode>,
    pub detected_color: String,
    pub valid_files: Vec<String>,
    pub invalid_files: Vec<InvalidFile>,
    pub stats: FolderStats,
}

impl FolderAnalysis {
    pub fn new(name: impl Into<String>, result: ClassificationResult) -> Self {
        let stats = FolderStats {
            total: result.total_files,
            valid: result.valid_files.len(),
            invalid: result.invalid_files.len(),
            pngs_to_convert: result.png_count,
        };
        FolderAnalysis {
            name: name.into(),
            detected_country: result.country,
            detected_color: result.color,
            valid_files: result.valid_files,
            invalid_files: result.invalid_files,
            stats,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub total_folders: usize,
    pub total_files: usize,
    pub total_valid: usize,
    pub total_invalid: usize,
    pub total_pngs_to_convert: usize,
}

/// Preview report: per-folder analysis, code validity split and totals.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub success: bool,
    pub folders: Vec<FolderAnalysis>,
    pub codes_validation: CodeValidation,
    pub summary: AnalysisSummary,
}

impl AnalysisReport {
    pub fn new(folders: Vec<FolderAnalysis>, codes_validation: CodeValidation) -> Self {
        let summary = folders.iter().fold(
            AnalysisSummary {
                total_folders: folders.len(),
                ..AnalysisSummary::default()
            },
            |mut acc, folder| {
                acc.total_files += folder.stats.total;
                acc.total_valid += folder.stats.valid;
                acc.total_invalid += folder.stats.invalid;
                acc.total_pngs_to_convert += folder.stats.pngs_to_convert;
                acc
            },
        );

        AnalysisReport {
            success: true,
            folders,
            codes_validation,
            summary,
        }
    }
}
