use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sanitize filename for archive entry to prevent path traversal.
/// Extracts only the base name (strips path components like `../`).
fn sanitize_archive_filename(path: &Path, fallback: &str) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .unwrap_or(fallback)
        .to_string()
}

/// Create a ZIP archive at `dest` holding `files`, each stored flat under its
/// base name. Returns the number of entries written.
pub fn create_zip_archive(files: &[PathBuf], dest: &Path) -> Result<usize> {
    use zip::write::{FileOptions, ZipWriter};
    use zip::CompressionMethod;

    let out = File::create(dest)
        .with_context(|| format!("Failed to create archive: {}", dest.display()))?;
    let mut zip = ZipWriter::new(out);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (index, path) in files.iter().enumerate() {
        let file_data = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let safe_filename = sanitize_archive_filename(path, &format!("unnamed_{}", index));

        zip.start_file(&safe_filename, options)
            .with_context(|| format!("Failed to add file to ZIP: {}", safe_filename))?;
        zip.write_all(&file_data)
            .with_context(|| format!("Failed to write file data to ZIP: {}", safe_filename))?;
    }

    zip.finish().context("Failed to finalize ZIP archive")?;

    tracing::debug!(archive = %dest.display(), entries = files.len(), "ZIP archive created");

    Ok(files.len())
}

/// Zip every regular file directly inside `dir`, in name order.
pub fn zip_directory(dir: &Path, dest: &Path) -> Result<usize> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    create_zip_archive(&files, dest)
}
