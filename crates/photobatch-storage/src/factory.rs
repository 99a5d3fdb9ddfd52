#[cfg(feature = "storage-local")]
use crate::LocalStore;
#[cfg(feature = "storage-memory")]
use crate::MemoryStore;
use crate::{RemoteStore, StoreBackend, StoreError, StoreResult};
use photobatch_core::Config;
use std::sync::Arc;

/// Create a remote store backend based on configuration
pub async fn create_store(config: &Config) -> StoreResult<Arc<dyn RemoteStore>> {
    match config.store_backend {
        #[cfg(feature = "storage-local")]
        StoreBackend::Local => {
            let base_path = config.local_store_path.clone().ok_or_else(|| {
                StoreError::ConfigError("LOCAL_STORE_PATH not configured".to_string())
            })?;

            let store = LocalStore::new(base_path).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        StoreBackend::Local => Err(StoreError::ConfigError(
            "Local store backend not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-memory")]
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store, nothing will be persisted");
            Ok(Arc::new(MemoryStore::new()))
        }

        #[cfg(not(feature = "storage-memory"))]
        StoreBackend::Memory => Err(StoreError::ConfigError(
            "Memory store backend not available (storage-memory feature not enabled)".to_string(),
        )),
    }
}
