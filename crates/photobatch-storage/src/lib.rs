//! Photobatch Storage Library
//!
//! This crate provides the remote store abstraction the batch pipeline publishes
//! into, together with a local-filesystem backend and an in-memory backend.
//!
//! # Identifiers
//!
//! Folder and file identifiers are opaque to callers. The local backend uses
//! validated store-relative paths; the in-memory backend uses random UUIDs.
//! Callers must only pass back identifiers obtained from the same store.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-memory")]
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use factory::create_store;
#[cfg(feature = "storage-local")]
pub use local::LocalStore;
#[cfg(feature = "storage-memory")]
pub use memory::{CallSnapshot, MemoryStore};
pub use photobatch_core::StoreBackend;
pub use traits::{
    FileId, FileRef, FolderId, RemoteEntry, RemoteFolder, RemoteStore, StoreError, StoreResult,
};
