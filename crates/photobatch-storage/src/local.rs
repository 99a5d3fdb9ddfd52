use crate::traits::{
    mime_for, FileId, FileRef, FolderId, RemoteEntry, RemoteFolder, RemoteStore, StoreError,
    StoreResult,
};
use crate::StoreBackend;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Local filesystem store: the remote tree is mirrored as directories below
/// `base_path`. Handles are `/`-separated paths relative to `base_path`.
#[derive(Clone)]
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    /// Create a new LocalStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory of the mirrored tree (created if missing)
    pub async fn new(base_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StoreError::ConfigError(format!(
                "Failed to create store directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// A single path segment: no separators, no traversal, not empty.
    fn validate_name(name: &str) -> StoreResult<()> {
        if name.trim().is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(StoreError::InvalidName(format!(
                "'{}' is not a valid folder or file name",
                name
            )));
        }
        Ok(())
    }

    /// Convert a handle to a filesystem path with security validation
    ///
    /// Handles must stay inside the base directory: absolute paths and `..`
    /// components are rejected.
    fn id_to_path(&self, id: &str) -> StoreResult<PathBuf> {
        if id.is_empty() {
            return Ok(self.base_path.clone());
        }

        let relative = Path::new(id);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StoreError::InvalidName(format!(
                "Handle '{}' escapes the store directory",
                id
            )));
        }

        Ok(self.base_path.join(relative))
    }

    fn child_id(parent: Option<&FolderId>, name: &str) -> String {
        match parent {
            Some(parent) if !parent.as_str().is_empty() => format!("{}/{}", parent.as_str(), name),
            _ => name.to_string(),
        }
    }

    fn parent_path(&self, parent: Option<&FolderId>) -> StoreResult<PathBuf> {
        match parent {
            Some(parent) => self.id_to_path(parent.as_str()),
            None => Ok(self.base_path.clone()),
        }
    }

    /// Sorted directory listing of `parent`.
    async fn read_children(&self, parent: &FolderId) -> StoreResult<Vec<(String, bool)>> {
        let dir = self.id_to_path(parent.as_str())?;
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(StoreError::NotFound(parent.to_string()));
        }

        let mut entries = fs::read_dir(&dir).await?;
        let mut children = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                tracing::warn!(path = %entry.path().display(), "Skipping non UTF-8 entry");
                continue;
            };
            let is_dir = entry.file_type().await?.is_dir();
            children.push((name, is_dir));
        }
        children.sort();
        Ok(children)
    }
}

#[async_trait]
impl RemoteStore for LocalStore {
    async fn find_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> StoreResult<Option<FolderId>> {
        Self::validate_name(name)?;
        let path = self.parent_path(parent)?.join(name);

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::LookupFailed(format!(
                    "Failed to stat {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        if metadata.is_dir() {
            Ok(Some(FolderId::new(Self::child_id(parent, name))))
        } else {
            Ok(None)
        }
    }

    async fn create_folder(&self, name: &str, parent: Option<&FolderId>) -> StoreResult<FolderId> {
        Self::validate_name(name)?;
        let parent_dir = self.parent_path(parent)?;
        if !fs::try_exists(&parent_dir).await.unwrap_or(false) {
            return Err(StoreError::NotFound(format!(
                "Parent folder {} does not exist",
                parent_dir.display()
            )));
        }

        let path = parent_dir.join(name);
        match fs::create_dir(&path).await {
            Ok(()) => {}
            // Already there: a concurrent creator won, hand back the same folder.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => {}
            Err(e) => {
                return Err(StoreError::CreateFailed(format!(
                    "Failed to create folder {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        tracing::info!(path = %path.display(), "Local store folder created");

        Ok(FolderId::new(Self::child_id(parent, name)))
    }

    async fn list_child_folders(&self, parent: &FolderId) -> StoreResult<Vec<RemoteFolder>> {
        Ok(self
            .read_children(parent)
            .await?
            .into_iter()
            .filter(|(_, is_dir)| *is_dir)
            .map(|(name, _)| RemoteFolder {
                id: FolderId::new(Self::child_id(Some(parent), &name)),
                name,
            })
            .collect())
    }

    async fn list_children(&self, parent: &FolderId) -> StoreResult<Vec<RemoteEntry>> {
        Ok(self
            .read_children(parent)
            .await?
            .into_iter()
            .map(|(name, is_dir)| {
                let id = Self::child_id(Some(parent), &name);
                if is_dir {
                    RemoteEntry::Folder(RemoteFolder {
                        id: FolderId::new(id),
                        name,
                    })
                } else {
                    RemoteEntry::File(FileRef {
                        id: FileId::new(id),
                        mime_type: mime_for(&name),
                        name,
                    })
                }
            })
            .collect())
    }

    async fn upload_file(&self, local_path: &Path, parent: &FolderId) -> StoreResult<FileId> {
        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                StoreError::InvalidName(format!("No file name in {}", local_path.display()))
            })?;
        Self::validate_name(name)?;

        let dest = self.id_to_path(parent.as_str())?.join(name);
        let start = std::time::Instant::now();

        let size = fs::copy(local_path, &dest).await.map_err(|e| {
            StoreError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                local_path.display(),
                dest.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %dest.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local store upload successful"
        );

        Ok(FileId::new(Self::child_id(Some(parent), name)))
    }

    async fn download_file(&self, file: &FileId, dest_path: &Path) -> StoreResult<()> {
        let path = self.id_to_path(file.as_str())?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StoreError::NotFound(file.to_string()));
        }

        let size = fs::copy(&path, dest_path).await.map_err(|e| {
            StoreError::DownloadFailed(format!(
                "Failed to copy {} to {}: {}",
                path.display(),
                dest_path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local store download successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Local
    }
}

#[cfg(all(test, feature = "storage-local"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_find_then_create_folder() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        assert_eq!(store.find_folder("LEBENGOOD", None).await.unwrap(), None);

        let root = store.create_folder("LEBENGOOD", None).await.unwrap();
        assert_eq!(root.as_str(), "LEBENGOOD");
        assert_eq!(
            store.find_folder("LEBENGOOD", None).await.unwrap(),
            Some(root.clone())
        );

        let child = store.create_folder("FOTOS", Some(&root)).await.unwrap();
        assert_eq!(child.as_str(), "LEBENGOOD/FOTOS");
        assert!(dir.path().join("LEBENGOOD/FOTOS").is_dir());
    }

    #[tokio::test]
    async fn test_create_existing_folder_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let first = store.create_folder("A", None).await.unwrap();
        let second = store.create_folder("A", None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let result = store.find_folder("..", None).await;
        assert!(matches!(result, Err(StoreError::InvalidName(_))));

        let result = store.create_folder("a/b", None).await;
        assert!(matches!(result, Err(StoreError::InvalidName(_))));

        let result = store
            .list_children(&FolderId::new("../../etc"))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidName(_))));

        let result = store
            .download_file(&FileId::new("/etc/passwd"), &dir.path().join("x"))
            .await;
        assert!(matches!(result, Err(StoreError::InvalidName(_))));
    }

    #[tokio::test]
    async fn test_upload_download_and_listing() {
        let dir = tempdir().unwrap();
        let scratch = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let folder = store.create_folder("COLOR", None).await.unwrap();
        store.create_folder("SUB", Some(&folder)).await.unwrap();

        let source = scratch.path().join("B01.PT01.jpg");
        std::fs::write(&source, b"jpeg bytes").unwrap();
        let file_id = store.upload_file(&source, &folder).await.unwrap();
        assert_eq!(file_id.as_str(), "COLOR/B01.PT01.jpg");

        let folders = store.list_child_folders(&folder).await.unwrap();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "SUB");

        let children = store.list_children(&folder).await.unwrap();
        assert_eq!(children.len(), 2);
        assert!(children.iter().any(|entry| matches!(
            entry,
            RemoteEntry::File(f) if f.mime_type == "image/jpeg"
        )));

        let dest = scratch.path().join("downloaded.jpg");
        store.download_file(&file_id, &dest).await.unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"jpeg bytes");
    }

    #[tokio::test]
    async fn test_list_images_recursive() {
        let dir = tempdir().unwrap();
        let store = LocalStore::new(dir.path()).await.unwrap();

        let nested = dir.path().join("ART/RED/deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("ART/top.png"), b"p").unwrap();
        std::fs::write(dir.path().join("ART/RED/B01.MAIN.jpg"), b"j").unwrap();
        std::fs::write(nested.join("B02.PT01.webp"), b"w").unwrap();
        std::fs::write(nested.join("notes.txt"), b"t").unwrap();

        let images = store
            .list_images_recursive(&FolderId::new("ART"))
            .await
            .unwrap();
        let mut names: Vec<_> = images.iter().map(|f| f.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["B01.MAIN.jpg", "B02.PT01.webp", "top.png"]);
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("a.JPG"), "image/jpeg");
        assert_eq!(mime_for("a.png"), "image/png");
        assert_eq!(mime_for("bundle.zip"), "application/zip");
        assert_eq!(mime_for("notes.txt"), "application/octet-stream");
    }
}
