use anyhow::Context;
use photobatch_core::UploadBatch;
use std::fs;
use std::path::{Path, PathBuf};

/// Initialize tracing for the CLI. Logs go to stderr so stdout stays JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Read local directories the way a browser folder upload sends them.
///
/// Every regular file below each directory becomes an upload whose path starts
/// with the directory's own name, so files are grouped by the folder that
/// directly contains them.
pub fn load_batch(dirs: &[PathBuf]) -> anyhow::Result<UploadBatch> {
    let mut uploads: Vec<(String, Vec<u8>)> = Vec::new();

    for dir in dirs {
        if !dir.is_dir() {
            anyhow::bail!("Not a directory: {}", dir.display());
        }
        let base = dir
            .canonicalize()
            .with_context(|| format!("Resolve {}", dir.display()))?;
        let prefix = base
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        collect_files(&base, &prefix, &mut uploads)?;
    }

    tracing::debug!(files = uploads.len(), "Local files loaded");
    Ok(UploadBatch::from_uploads(uploads))
}

fn collect_files(dir: &Path, prefix: &str, out: &mut Vec<(String, Vec<u8>)>) -> anyhow::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Read directory {}", dir.display()))?
        .collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = format!("{}/{}", prefix, name);
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            collect_files(&entry.path(), &relative, out)?;
        } else if file_type.is_file() {
            let bytes = fs::read(entry.path())
                .with_context(|| format!("Read {}", entry.path().display()))?;
            out.push((relative, bytes));
        }
    }
    Ok(())
}
