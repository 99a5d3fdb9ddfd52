//! Photobatch Processing Library
//!
//! Local, CPU-bound side of the batch pipeline: folder classification, staging
//! of uploaded files, PNG→JPEG conversion, the rename fan-out and ZIP bundling.
//! Nothing in this crate talks to the remote store.

pub mod archive;
pub mod classifier;
pub mod convert;
pub mod fanout;
pub mod staging;

pub use archive::{create_zip_archive, zip_directory};
pub use classifier::{FolderClassifier, FolderVerdict};
pub use convert::{convert_png_to_jpeg, DEFAULT_JPEG_QUALITY};
pub use fanout::{FanoutEngine, FanoutSummary};
pub use staging::{StagingArea, WriteSummary};
