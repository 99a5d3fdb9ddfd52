//! Test helpers: in-memory store, recorded progress and batch builders.
//!
//! Run from workspace root: `cargo test -p photobatch-services`.

#![allow(dead_code)]

pub mod fixtures;

use photobatch_core::{Config, FolderSubmission, UploadBatch, UploadedFile};
use photobatch_services::{BatchOrchestrator, BatchRequest, FolderTools, ProgressSink};
use photobatch_storage::MemoryStore;
use std::sync::{Arc, Mutex};

/// Remote root used by the default configuration.
pub const ROOT: [&str; 3] = ["LEBENGOOD", "FOTOS", "FOTOS ORDENADAS"];

/// Progress sink that keeps every line.
#[derive(Default)]
pub struct RecordedProgress(Mutex<Vec<String>>);

impl RecordedProgress {
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl ProgressSink for RecordedProgress {
    fn publish(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

pub struct TestEnv {
    pub store: Arc<MemoryStore>,
    pub progress: Arc<RecordedProgress>,
    pub config: Config,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        TestEnv {
            store: Arc::new(store),
            progress: Arc::new(RecordedProgress::default()),
            config: Config::default(),
        }
    }

    pub fn orchestrator(&self) -> BatchOrchestrator {
        BatchOrchestrator::new(self.store.clone(), &self.config, self.progress.clone())
    }

    pub fn folder_tools(&self) -> FolderTools {
        FolderTools::new(self.store.clone(), &self.config, self.progress.clone())
    }

    /// Path segments from the store root down to `rest`.
    pub fn path<'a>(&self, rest: &[&'a str]) -> Vec<&'a str> {
        ROOT.iter().copied().chain(rest.iter().copied()).collect()
    }
}

pub fn folder(name: &str, files: Vec<UploadedFile>) -> FolderSubmission {
    FolderSubmission::new(name, files)
}

pub fn jpeg(name: &str) -> UploadedFile {
    UploadedFile::new(name, format!("jpeg:{}", name).into_bytes())
}

pub fn request(article: &str, codes: &str, folders: Vec<FolderSubmission>) -> BatchRequest {
    BatchRequest {
        article: article.to_string(),
        codes: codes.to_string(),
        batch: UploadBatch::new(folders),
        only_images: false,
    }
}
