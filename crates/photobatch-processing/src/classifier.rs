use photobatch_core::grammar::{
    classify_country, extract_color, has_marker, is_image_file, is_png, is_system_file,
    validate_pt_suffix,
};
use photobatch_core::{
    AnalysisReport, AppError, ClassificationResult, CountryCode, FolderAnalysis,
    FolderSubmission, InvalidFile, InvalidReason, ProductCode, UploadBatch,
};

/// Remote placement of a folder that passed every folder-level check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderVerdict {
    pub country: CountryCode,
    pub color: String,
}

/// Folder classifier
///
/// Pure functions over folder names and file names. Preview and processing
/// both go through [`FolderClassifier::classify_files`], so a folder previewed
/// as clean is processed with the same verdict.
pub struct FolderClassifier;

impl FolderClassifier {
    /// Classify an uploaded folder.
    pub fn classify(folder: &FolderSubmission) -> ClassificationResult {
        Self::classify_files(
            &folder.display_name,
            folder.files.iter().map(|file| file.name.as_str()),
        )
    }

    /// Classify a folder given its display name and the names of its files.
    ///
    /// Housekeeping files are counted in `total_files` and otherwise ignored.
    /// The remaining files are checked in order (image extension, `.PT`
    /// suffix, marker) and the first failed check is recorded.
    pub fn classify_files<'a, I>(display_name: &str, file_names: I) -> ClassificationResult
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut valid_files = Vec::new();
        let mut invalid_files = Vec::new();
        let mut png_count = 0;
        let mut total_files = 0;

        for name in file_names {
            total_files += 1;
            if is_system_file(name) {
                continue;
            }

            match Self::check_file(name) {
                Some(reason) => invalid_files.push(InvalidFile {
                    name: name.to_string(),
                    reason,
                }),
                None => {
                    if is_png(name) {
                        png_count += 1;
                    }
                    valid_files.push(name.to_string());
                }
            }
        }

        ClassificationResult {
            country: classify_country(display_name),
            color: extract_color(display_name),
            valid_files,
            invalid_files,
            png_count,
            total_files,
        }
    }

    fn check_file(name: &str) -> Option<InvalidReason> {
        if !is_image_file(name) {
            Some(InvalidReason::NotAnImage)
        } else if !validate_pt_suffix(name) {
            Some(InvalidReason::MalformedPtSuffix)
        } else if !has_marker(name) {
            Some(InvalidReason::MissingMarker)
        } else {
            None
        }
    }

    /// Folder-level verdict used before anything is resolved or uploaded.
    ///
    /// Checks run in a fixed order: invalid files, no valid images, unknown
    /// country, empty color.
    pub fn validate_for_processing(
        folder_name: &str,
        result: &ClassificationResult,
    ) -> Result<FolderVerdict, AppError> {
        if !result.invalid_files.is_empty() {
            let listed = result
                .invalid_files
                .iter()
                .map(|file| format!("{} ({})", file.name, file.reason.message()))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AppError::Validation(format!(
                "Folder '{}' has invalid files: {}",
                folder_name, listed
            )));
        }

        if result.valid_files.is_empty() {
            return Err(AppError::Validation(format!(
                "Folder '{}' has no image files",
                folder_name
            )));
        }

        let country = result.country.ok_or_else(|| {
            AppError::Validation(format!(
                "Could not detect a country in folder name '{}'",
                folder_name
            ))
        })?;

        if result.color.is_empty() {
            return Err(AppError::Validation(format!(
                "Could not extract a color from folder name '{}'",
                folder_name
            )));
        }

        Ok(FolderVerdict {
            country,
            color: result.color.clone(),
        })
    }

    /// Dry-run report for a whole batch: classification of every folder plus
    /// the validity split of the code list. Touches no storage.
    pub fn analyze(batch: &UploadBatch, codes: &str) -> AnalysisReport {
        let folders = batch
            .folders
            .iter()
            .map(|folder| FolderAnalysis::new(folder.display_name.clone(), Self::classify(folder)))
            .collect();

        AnalysisReport::new(folders, ProductCode::parse_list(codes))
    }
}
