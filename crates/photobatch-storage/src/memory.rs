//! In-memory store backend.
//!
//! The whole remote tree lives in a `HashMap` behind a [`RwLock`], so every
//! trait method works on `&self`. Each call is counted, which lets tests assert
//! on the number of remote round-trips, and individual names can be configured
//! to fail so error paths are reachable without a real backend.

use crate::traits::{
    mime_for, FileId, FileRef, FolderId, RemoteEntry, RemoteFolder, RemoteStore, StoreError,
    StoreResult,
};
use crate::StoreBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum NodeKind {
    Folder,
    File { bytes: Bytes },
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<String>,
    seq: u64,
    kind: NodeKind,
}

/// Per-operation call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSnapshot {
    pub find: usize,
    pub create: usize,
    pub list: usize,
    pub upload: usize,
    pub download: usize,
}

impl CallSnapshot {
    pub fn total(&self) -> usize {
        self.find + self.create + self.list + self.upload + self.download
    }
}

#[derive(Default)]
struct Counters {
    find: AtomicUsize,
    create: AtomicUsize,
    list: AtomicUsize,
    upload: AtomicUsize,
    download: AtomicUsize,
}

#[derive(Default)]
pub struct MemoryStore {
    nodes: RwLock<HashMap<String, Node>>,
    next_seq: AtomicU64,
    counters: Counters,
    failing_folders: HashSet<String>,
    failing_uploads: HashSet<String>,
    failing_downloads: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creating a folder with this name fails.
    pub fn with_failing_folder(mut self, name: impl Into<String>) -> Self {
        self.failing_folders.insert(name.into());
        self
    }

    /// Uploading a file with this name fails.
    pub fn with_failing_upload(mut self, file_name: impl Into<String>) -> Self {
        self.failing_uploads.insert(file_name.into());
        self
    }

    /// Downloading a file with this name fails.
    pub fn with_failing_download(mut self, file_name: impl Into<String>) -> Self {
        self.failing_downloads.insert(file_name.into());
        self
    }

    pub fn calls(&self) -> CallSnapshot {
        CallSnapshot {
            find: self.counters.find.load(Ordering::SeqCst),
            create: self.counters.create.load(Ordering::SeqCst),
            list: self.counters.list.load(Ordering::SeqCst),
            upload: self.counters.upload.load(Ordering::SeqCst),
            download: self.counters.download.load(Ordering::SeqCst),
        }
    }

    /// Find-or-create every segment of `segments` from the root, without
    /// touching the call counters. Returns the handle of the last segment.
    pub async fn seed_folder_path(&self, segments: &[&str]) -> FolderId {
        let mut nodes = self.nodes.write().await;
        let mut parent: Option<String> = None;

        for segment in segments {
            let existing = nodes
                .iter()
                .find(|(_, node)| {
                    matches!(node.kind, NodeKind::Folder)
                        && node.name == *segment
                        && node.parent == parent
                })
                .map(|(id, _)| id.clone());

            let id = match existing {
                Some(id) => id,
                None => self.insert(&mut nodes, segment, parent.clone(), NodeKind::Folder),
            };
            parent = Some(id);
        }

        FolderId::new(parent.unwrap_or_default())
    }

    /// Place a file directly, without touching the call counters.
    pub async fn seed_file(
        &self,
        parent: &FolderId,
        name: &str,
        bytes: impl Into<Bytes>,
    ) -> FileId {
        let mut nodes = self.nodes.write().await;
        let id = self.insert(
            &mut nodes,
            name,
            Some(parent.as_str().to_string()),
            NodeKind::File {
                bytes: bytes.into(),
            },
        );
        FileId::new(id)
    }

    /// Names of the files directly inside `parent`, in upload order.
    pub async fn files_in(&self, parent: &FolderId) -> Vec<String> {
        let nodes = self.nodes.read().await;
        Self::sorted_children(&nodes, Some(parent.as_str()))
            .into_iter()
            .filter(|(_, node)| matches!(node.kind, NodeKind::File { .. }))
            .map(|(_, node)| node.name.clone())
            .collect()
    }

    /// Contents of the file named `name` directly inside `parent`.
    pub async fn file_bytes(&self, parent: &FolderId, name: &str) -> Option<Bytes> {
        let nodes = self.nodes.read().await;
        nodes.values().find_map(|node| match &node.kind {
            NodeKind::File { bytes }
                if node.name == name && node.parent.as_deref() == Some(parent.as_str()) =>
            {
                Some(bytes.clone())
            }
            _ => None,
        })
    }

    /// Handle of the folder at `segments` from the root, if every segment exists.
    pub async fn folder_at(&self, segments: &[&str]) -> Option<FolderId> {
        let nodes = self.nodes.read().await;
        let mut parent: Option<String> = None;
        for segment in segments {
            let id = nodes
                .iter()
                .find(|(_, node)| {
                    matches!(node.kind, NodeKind::Folder)
                        && node.name == *segment
                        && node.parent == parent
                })
                .map(|(id, _)| id.clone())?;
            parent = Some(id);
        }
        parent.map(FolderId::new)
    }

    pub async fn folder_count(&self) -> usize {
        let nodes = self.nodes.read().await;
        nodes
            .values()
            .filter(|node| matches!(node.kind, NodeKind::Folder))
            .count()
    }

    fn insert(
        &self,
        nodes: &mut HashMap<String, Node>,
        name: &str,
        parent: Option<String>,
        kind: NodeKind,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        nodes.insert(
            id.clone(),
            Node {
                name: name.to_string(),
                parent,
                seq,
                kind,
            },
        );
        id
    }

    fn sorted_children<'a>(
        nodes: &'a HashMap<String, Node>,
        parent: Option<&str>,
    ) -> Vec<(&'a String, &'a Node)> {
        let mut children: Vec<_> = nodes
            .iter()
            .filter(|(_, node)| node.parent.as_deref() == parent)
            .collect();
        children.sort_by_key(|(_, node)| node.seq);
        children
    }

    fn ensure_folder(nodes: &HashMap<String, Node>, id: &str) -> StoreResult<()> {
        match nodes.get(id) {
            Some(Node {
                kind: NodeKind::Folder,
                ..
            }) => Ok(()),
            _ => Err(StoreError::NotFound(format!("folder {}", id))),
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn find_folder(
        &self,
        name: &str,
        parent: Option<&FolderId>,
    ) -> StoreResult<Option<FolderId>> {
        self.counters.find.fetch_add(1, Ordering::SeqCst);
        let nodes = self.nodes.read().await;
        let parent = parent.map(FolderId::as_str);

        Ok(Self::sorted_children(&nodes, parent)
            .into_iter()
            .find(|(_, node)| matches!(node.kind, NodeKind::Folder) && node.name == name)
            .map(|(id, _)| FolderId::new(id.clone())))
    }

    async fn create_folder(&self, name: &str, parent: Option<&FolderId>) -> StoreResult<FolderId> {
        self.counters.create.fetch_add(1, Ordering::SeqCst);
        if self.failing_folders.contains(name) {
            return Err(StoreError::CreateFailed(format!(
                "Injected failure creating folder '{}'",
                name
            )));
        }

        let mut nodes = self.nodes.write().await;
        if let Some(parent) = parent {
            Self::ensure_folder(&nodes, parent.as_str())?;
        }
        let id = self.insert(
            &mut nodes,
            name,
            parent.map(|p| p.as_str().to_string()),
            NodeKind::Folder,
        );

        tracing::debug!(folder = %name, id = %id, "Memory store folder created");

        Ok(FolderId::new(id))
    }

    async fn list_child_folders(&self, parent: &FolderId) -> StoreResult<Vec<RemoteFolder>> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        let nodes = self.nodes.read().await;
        Self::ensure_folder(&nodes, parent.as_str())?;

        Ok(Self::sorted_children(&nodes, Some(parent.as_str()))
            .into_iter()
            .filter(|(_, node)| matches!(node.kind, NodeKind::Folder))
            .map(|(id, node)| RemoteFolder {
                id: FolderId::new(id.clone()),
                name: node.name.clone(),
            })
            .collect())
    }

    async fn list_children(&self, parent: &FolderId) -> StoreResult<Vec<RemoteEntry>> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        let nodes = self.nodes.read().await;
        Self::ensure_folder(&nodes, parent.as_str())?;

        Ok(Self::sorted_children(&nodes, Some(parent.as_str()))
            .into_iter()
            .map(|(id, node)| match node.kind {
                NodeKind::Folder => RemoteEntry::Folder(RemoteFolder {
                    id: FolderId::new(id.clone()),
                    name: node.name.clone(),
                }),
                NodeKind::File { .. } => RemoteEntry::File(FileRef {
                    id: FileId::new(id.clone()),
                    name: node.name.clone(),
                    mime_type: mime_for(&node.name),
                }),
            })
            .collect())
    }

    async fn upload_file(&self, local_path: &Path, parent: &FolderId) -> StoreResult<FileId> {
        self.counters.upload.fetch_add(1, Ordering::SeqCst);
        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                StoreError::InvalidName(format!("No file name in {}", local_path.display()))
            })?
            .to_string();

        if self.failing_uploads.contains(&name) {
            return Err(StoreError::UploadFailed(format!(
                "Injected failure uploading '{}'",
                name
            )));
        }

        let data = tokio::fs::read(local_path).await.map_err(|e| {
            StoreError::UploadFailed(format!("Failed to read {}: {}", local_path.display(), e))
        })?;
        let size = data.len();

        let mut nodes = self.nodes.write().await;
        Self::ensure_folder(&nodes, parent.as_str())?;
        let id = self.insert(
            &mut nodes,
            &name,
            Some(parent.as_str().to_string()),
            NodeKind::File {
                bytes: Bytes::from(data),
            },
        );

        tracing::debug!(file = %name, size_bytes = size, "Memory store upload successful");

        Ok(FileId::new(id))
    }

    async fn download_file(&self, file: &FileId, dest_path: &Path) -> StoreResult<()> {
        self.counters.download.fetch_add(1, Ordering::SeqCst);
        let (name, bytes) = {
            let nodes = self.nodes.read().await;
            match nodes.get(file.as_str()) {
                Some(Node {
                    name,
                    kind: NodeKind::File { bytes },
                    ..
                }) => (name.clone(), bytes.clone()),
                _ => return Err(StoreError::NotFound(format!("file {}", file))),
            }
        };

        if self.failing_downloads.contains(&name) {
            return Err(StoreError::DownloadFailed(format!(
                "Injected failure downloading '{}'",
                name
            )));
        }

        tokio::fs::write(dest_path, &bytes).await.map_err(|e| {
            StoreError::DownloadFailed(format!("Failed to write {}: {}", dest_path.display(), e))
        })?;

        Ok(())
    }

    fn backend_type(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}
