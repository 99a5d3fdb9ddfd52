//! Destination folder resolution
//!
//! Files land in `<root>/<category>/<subcategory>/<country>/<article>/<color>`.
//! The resolver walks that path segment by segment with search-before-create,
//! and remembers every handle it has seen so a batch only pays for each
//! distinct folder once.

use photobatch_core::{AppError, CountryCode, RemoteRoot};
use photobatch_storage::{FolderId, RemoteStore, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Folder '{segment}' not found under '{parent}'")]
    FolderNotFound { segment: String, parent: String },

    #[error("Could not find or create folder '{segment}': {source}")]
    Store {
        segment: String,
        #[source]
        source: StoreError,
    },
}

impl From<ResolveError> for AppError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::FolderNotFound { .. } => AppError::FolderStructure(err.to_string()),
            ResolveError::Store { .. } => AppError::RemoteStore(err.to_string()),
        }
    }
}

/// Resolves (and creates) destination folders on a remote store.
///
/// Handles are cached per path prefix. The cache lock is held for the whole
/// walk, so two concurrent resolves of the same path never both create a
/// missing segment.
pub struct RemoteTreeResolver {
    store: Arc<dyn RemoteStore>,
    root: RemoteRoot,
    cache: Mutex<HashMap<Vec<String>, FolderId>>,
}

impl RemoteTreeResolver {
    pub fn new(store: Arc<dyn RemoteStore>, root: RemoteRoot) -> Self {
        RemoteTreeResolver {
            store,
            root,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &RemoteRoot {
        &self.root
    }

    /// Find-or-create `<root>/<category>/<subcategory>/<country>/<article>/<color>`.
    pub async fn resolve(
        &self,
        country: CountryCode,
        article: &str,
        color: &str,
    ) -> Result<FolderId, ResolveError> {
        let mut segments: Vec<&str> = self.root.segments().to_vec();
        segments.extend([country.folder_name(), article, color]);
        self.resolve_path(&segments).await
    }

    /// Find-or-create an arbitrary path below the store root.
    pub async fn resolve_path(&self, segments: &[&str]) -> Result<FolderId, ResolveError> {
        let mut cache = self.cache.lock().await;
        let mut parent: Option<FolderId> = None;

        for depth in 1..=segments.len() {
            let key: Vec<String> = segments[..depth].iter().map(|s| s.to_string()).collect();
            if let Some(id) = cache.get(&key) {
                parent = Some(id.clone());
                continue;
            }

            let segment = segments[depth - 1];
            let id = self.find_or_create(segment, parent.as_ref()).await?;
            cache.insert(key, id.clone());
            parent = Some(id);
        }

        parent.ok_or_else(|| ResolveError::FolderNotFound {
            segment: String::new(),
            parent: "<empty path>".to_string(),
        })
    }

    async fn find_or_create(
        &self,
        segment: &str,
        parent: Option<&FolderId>,
    ) -> Result<FolderId, ResolveError> {
        let store_err = |source: StoreError| ResolveError::Store {
            segment: segment.to_string(),
            source,
        };

        if let Some(id) = self
            .store
            .find_folder(segment, parent)
            .await
            .map_err(store_err)?
        {
            return Ok(id);
        }

        let id = self
            .store
            .create_folder(segment, parent)
            .await
            .map_err(store_err)?;
        tracing::info!(folder = %segment, "Created remote folder");
        Ok(id)
    }

    /// Walk an existing path without creating anything.
    ///
    /// Cached handles are reused; lookups that succeed are added to the cache.
    pub async fn resolve_existing(&self, segments: &[&str]) -> Result<FolderId, ResolveError> {
        let mut cache = self.cache.lock().await;
        let mut parent: Option<FolderId> = None;

        for depth in 1..=segments.len() {
            let key: Vec<String> = segments[..depth].iter().map(|s| s.to_string()).collect();
            if let Some(id) = cache.get(&key) {
                parent = Some(id.clone());
                continue;
            }

            let segment = segments[depth - 1];
            let found = self
                .store
                .find_folder(segment, parent.as_ref())
                .await
                .map_err(|source| ResolveError::Store {
                    segment: segment.to_string(),
                    source,
                })?;

            let Some(id) = found else {
                return Err(ResolveError::FolderNotFound {
                    segment: segment.to_string(),
                    parent: if depth == 1 {
                        "<root>".to_string()
                    } else {
                        segments[..depth - 1].join("/")
                    },
                });
            };
            cache.insert(key, id.clone());
            parent = Some(id);
        }

        parent.ok_or_else(|| ResolveError::FolderNotFound {
            segment: String::new(),
            parent: "<empty path>".to_string(),
        })
    }

    /// Handle of the static root (`<root>/<category>/<subcategory>`), which
    /// must already exist.
    pub async fn existing_root(&self) -> Result<FolderId, ResolveError> {
        self.resolve_existing(&self.root.segments()).await
    }
}
