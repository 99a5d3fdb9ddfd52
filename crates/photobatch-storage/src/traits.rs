//! Remote store abstraction trait
//!
//! This module defines the `RemoteStore` trait that every backend implements.
//! The batch pipeline only ever talks to a store through this trait.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use async_trait::async_trait;
use photobatch_core::grammar::is_image_file;
use photobatch_core::AppError;
use serde::Serialize;
use thiserror::Error;

use crate::StoreBackend;

/// Remote store operation errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Folder lookup failed: {0}")]
    LookupFailed(String),

    #[error("Folder creation failed: {0}")]
    CreateFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::RemoteStore(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque folder handle returned by a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FolderId(String);

impl FolderId {
    pub fn new(id: impl Into<String>) -> Self {
        FolderId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FolderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Opaque file handle returned by a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        FileId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteFolder {
    pub id: FolderId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRef {
    pub id: FileId,
    pub name: String,
    pub mime_type: String,
}

impl FileRef {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Best-effort MIME type from a file name.
pub(crate) fn mime_for(name: &str) -> String {
    let extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg".to_string(),
        "svg" => "image/svg+xml".to_string(),
        "ico" => "image/x-icon".to_string(),
        "zip" => "application/zip".to_string(),
        ext if is_image_file(name) => format!("image/{}", ext),
        _ => "application/octet-stream".to_string(),
    }
}

/// One direct child of a remote folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEntry {
    Folder(RemoteFolder),
    File(FileRef),
}

/// Remote store abstraction trait
///
/// Every call is a potential network round-trip. Lookups return `Ok(None)` for
/// "not there" and reserve `Err` for calls that failed; callers rely on that
/// distinction to decide between creating a folder and giving up.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Find a child folder by exact name. `parent = None` searches the store root.
    async fn find_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> StoreResult<Option<FolderId>>;

    /// Create a folder and return its handle.
    async fn create_folder(&self, name: &str, parent: Option<&FolderId>) -> StoreResult<FolderId>;

    /// List the direct child folders of `parent`.
    async fn list_child_folders(&self, parent: &FolderId) -> StoreResult<Vec<RemoteFolder>>;

    /// List every direct child (folders and files) of `parent`.
    async fn list_children(&self, parent: &FolderId) -> StoreResult<Vec<RemoteEntry>>;

    /// Upload a local file into `parent`, keeping its file name.
    async fn upload_file(&self, local_path: &Path, parent: &FolderId) -> StoreResult<FileId>;

    /// Download a file to `dest_path` (the full destination file path).
    async fn download_file(&self, file: &FileId, dest_path: &Path) -> StoreResult<()>;

    /// Get the store backend type
    fn backend_type(&self) -> StoreBackend;

    /// Every image file below `folder`, at any depth.
    ///
    /// Walks the tree with an explicit worklist so deep trees do not grow the
    /// call stack.
    async fn list_images_recursive(&self, folder: &FolderId) -> StoreResult<Vec<FileRef>> {
        let mut pending = vec![folder.clone()];
        let mut images = Vec::new();

        while let Some(current) = pending.pop() {
            let mut subfolders = Vec::new();
            for entry in self.list_children(&current).await? {
                match entry {
                    RemoteEntry::Folder(child) => subfolders.push(child.id),
                    RemoteEntry::File(file) if file.is_image() => images.push(file),
                    RemoteEntry::File(_) => {}
                }
            }
            // Reversed so sibling folders pop off the stack in listing order.
            pending.extend(subfolders.into_iter().rev());
        }

        Ok(images)
    }
}
