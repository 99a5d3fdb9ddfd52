//! Photobatch Services Library
//!
//! Remote-facing side of the pipeline: resolving the destination folder tree,
//! orchestrating a batch folder by folder, progress fan-out and the standalone
//! folder tools (country listing, article folder creation, photo gathering).

pub mod folders;
pub mod orchestrator;
pub mod progress;
pub mod resolver;

pub use folders::{ArticleFoldersReport, CountriesReport, FolderTools, GatherReport};
pub use orchestrator::{BatchOrchestrator, BatchRequest};
pub use progress::{
    BroadcastProgress, NoopProgress, ProgressChannel, ProgressReporter, ProgressSink,
    TracingProgress,
};
pub use resolver::{RemoteTreeResolver, ResolveError};
