use photobatch_core::grammar::{is_image_file, is_system_file, normalize_case};
use photobatch_core::{AppError, UploadedFile};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Result of writing a folder's uploads to disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    pub saved: usize,
    pub skipped: usize,
}

/// Per-folder scratch space.
///
/// ```text
/// <tmp>/<folder>/                   uploaded sources
/// <tmp>/<ARTICLE>_<folder>/         renamed outputs
/// <tmp>/<ARTICLE>_<folder>.zip      bundle of the outputs
/// <tmp>/converted/                  PNG conversions awaiting fan-out
/// ```
///
/// Everything lives inside one [`TempDir`] and is removed when the area is
/// dropped, whichever way the folder's processing ends.
pub struct StagingArea {
    root: TempDir,
    source_dir: PathBuf,
    output_dir: PathBuf,
    converted_dir: PathBuf,
    output_name: String,
}

/// Reduce a display name to a single safe path segment.
fn path_segment(name: &str, fallback: &str) -> String {
    Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

impl StagingArea {
    /// Create the staging directories for one folder.
    ///
    /// `parent` overrides the system temp dir.
    pub fn new(parent: Option<&Path>, folder_name: &str, article: &str) -> Result<Self, AppError> {
        let root = match parent {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                tempfile::Builder::new()
                    .prefix("photobatch-")
                    .tempdir_in(parent)?
            }
            None => tempfile::Builder::new().prefix("photobatch-").tempdir()?,
        };

        let folder = path_segment(folder_name, "folder");
        let article = path_segment(&article.trim().to_uppercase(), "ARTICLE");
        let output_name = format!("{}_{}", article, folder);

        let source_dir = root.path().join(&folder);
        let output_dir = root.path().join(&output_name);
        fs::create_dir_all(&source_dir)?;
        fs::create_dir_all(&output_dir)?;
        // Output dirs always carry the article prefix, only the source dir can clash.
        let converted_dir = match folder.as_str() {
            "converted" => root.path().join("converted_"),
            _ => root.path().join("converted"),
        };
        fs::create_dir_all(&converted_dir)?;

        Ok(StagingArea {
            root,
            source_dir,
            output_dir,
            converted_dir,
            output_name,
        })
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Scratch dir for converted JPEGs, never shared with outputs.
    pub fn converted_dir(&self) -> &Path {
        &self.converted_dir
    }

    /// Path of the ZIP bundle, a sibling of the output dir.
    pub fn archive_path(&self) -> PathBuf {
        self.root.path().join(format!("{}.zip", self.output_name))
    }

    /// Write uploads into the source dir.
    ///
    /// Housekeeping files are always skipped, non-images too when
    /// `only_images` is set.
    pub fn write_sources(
        &self,
        files: &[UploadedFile],
        only_images: bool,
    ) -> Result<WriteSummary, AppError> {
        let mut summary = WriteSummary::default();

        for file in files {
            let name = path_segment(&file.name, "");
            if name.is_empty() || name != file.name {
                tracing::warn!(file = %file.name, "Skipping upload with unusable file name");
                summary.skipped += 1;
                continue;
            }
            if is_system_file(&name) {
                tracing::debug!(file = %file.name, "Skipping housekeeping file");
                summary.skipped += 1;
                continue;
            }
            if only_images && !is_image_file(&name) {
                tracing::debug!(file = %file.name, "Skipping non-image file");
                summary.skipped += 1;
                continue;
            }

            fs::write(self.source_dir.join(&name), &file.bytes)?;
            summary.saved += 1;
        }

        Ok(summary)
    }

    /// Names of the staged sources, sorted.
    pub fn source_names(&self) -> Result<Vec<String>, AppError> {
        list_file_names(&self.source_dir)
    }

    /// Staged source paths, sorted by name.
    pub fn source_paths(&self) -> Result<Vec<PathBuf>, AppError> {
        Ok(self
            .source_names()?
            .into_iter()
            .map(|name| self.source_dir.join(name))
            .collect())
    }

    /// Staged output paths, sorted by name.
    pub fn output_paths(&self) -> Result<Vec<PathBuf>, AppError> {
        Ok(list_file_names(&self.output_dir)?
            .into_iter()
            .map(|name| self.output_dir.join(name))
            .collect())
    }

    /// Canonicalize `.pt<digits>`/`.main` casing of every staged source.
    ///
    /// Returns the `(old, new)` pairs that were renamed.
    pub fn normalize_sources(&self) -> Result<Vec<(String, String)>, AppError> {
        let mut renamed = Vec::new();

        for name in self.source_names()? {
            let normalized = normalize_case(&name);
            if normalized == name {
                continue;
            }
            fs::rename(self.source_dir.join(&name), self.source_dir.join(&normalized))?;
            tracing::debug!(from = %name, to = %normalized, "Normalized file name");
            renamed.push((name, normalized));
        }

        Ok(renamed)
    }
}

fn list_file_names(dir: &Path) -> Result<Vec<String>, AppError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => tracing::warn!(name = ?raw, "Skipping non UTF-8 file name"),
        }
    }
    names.sort();
    Ok(names)
}
