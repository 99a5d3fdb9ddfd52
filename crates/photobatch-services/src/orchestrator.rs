//! Batch orchestration
//!
//! A batch is processed one folder at a time. Each folder goes through
//! staging, classification, destination resolution, rename fan-out, upload and
//! archiving, and always ends in exactly one [`FolderOutcome`]. Only code
//! validation and an empty batch reject the whole request.

use futures::stream::{self, StreamExt};
use photobatch_core::{
    AnalysisReport, AppError, BatchReport, Config, ErrorMetadata, FolderOutcome,
    FolderSubmission, LogLevel, ProductCode, RemoteRoot, UploadBatch,
};
use photobatch_processing::{
    zip_directory, FanoutEngine, FanoutSummary, FolderClassifier, StagingArea,
};
use photobatch_storage::{FolderId, RemoteStore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::progress::{ProgressChannel, ProgressReporter, ProgressSink};
use crate::resolver::RemoteTreeResolver;

/// One processing request.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Article folder name; trimmed and uppercased before use
    pub article: String,
    /// Comma-separated product codes
    pub codes: String,
    pub batch: UploadBatch,
    /// Drop non-image uploads instead of failing their folder
    pub only_images: bool,
}

#[derive(Debug, Clone)]
struct Settings {
    remote_root: RemoteRoot,
    upload_concurrency: usize,
    jpeg_quality: u8,
    staging_dir: Option<PathBuf>,
}

pub struct BatchOrchestrator {
    store: Arc<dyn RemoteStore>,
    progress: Arc<dyn ProgressSink>,
    settings: Settings,
}

impl BatchOrchestrator {
    pub fn new(store: Arc<dyn RemoteStore>, config: &Config, progress: Arc<dyn ProgressSink>) -> Self {
        BatchOrchestrator {
            store,
            progress,
            settings: Settings {
                remote_root: config.remote_root.clone(),
                upload_concurrency: config.upload_concurrency.max(1),
                jpeg_quality: config.jpeg_quality,
                staging_dir: config.staging_dir.clone(),
            },
        }
    }

    /// Dry run: classify every folder and split the codes, without touching
    /// the filesystem or the store.
    pub fn preview(&self, request: &BatchRequest) -> AnalysisReport {
        FolderClassifier::analyze(&request.batch, &request.codes)
    }

    /// Process a whole batch.
    ///
    /// Returns `Err` only when the request itself is unusable (invalid or
    /// missing codes, empty article, no folders); in that case no remote call
    /// has been made. Otherwise every submitted folder has an outcome in the
    /// report, in submission order.
    #[tracing::instrument(skip_all, fields(article = %request.article, folders = request.batch.len()))]
    pub async fn process_batch(
        &self,
        request: BatchRequest,
        cancel: CancellationToken,
    ) -> Result<BatchReport, AppError> {
        let channel = ProgressChannel::spawn(self.progress.clone());
        let reporter = channel.reporter();

        let result = self.run(request, cancel, &reporter).await;
        if let Err(e) = &result {
            log_error("batch", e);
            reporter.report(format!("❌ {}", e.client_message())).await;
        }

        drop(reporter);
        channel.finish().await;
        result
    }

    async fn run(
        &self,
        request: BatchRequest,
        cancel: CancellationToken,
        reporter: &ProgressReporter,
    ) -> Result<BatchReport, AppError> {
        let codes = ProductCode::parse_list(&request.codes).into_valid()?;

        let article = request.article.trim().to_uppercase();
        if article.is_empty() {
            return Err(AppError::Validation("Article name is empty".to_string()));
        }
        if request.batch.is_empty() {
            return Err(AppError::Validation(
                "No folders found to process".to_string(),
            ));
        }

        let total = request.batch.len();
        reporter
            .report(format!("🚀 Processing {} folders for {}", total, article))
            .await;
        tracing::info!(
            article = %article,
            folders = total,
            codes = codes.len(),
            only_images = request.only_images,
            "Batch started"
        );

        // One resolver per batch: handle cache lives as long as the batch.
        let resolver = RemoteTreeResolver::new(self.store.clone(), self.settings.remote_root.clone());
        let mut outcomes = Vec::with_capacity(total);

        for (index, folder) in request.batch.folders.into_iter().enumerate() {
            let name = folder.display_name.clone();

            if cancel.is_cancelled() {
                let err = AppError::Cancelled(name.clone());
                tracing::warn!(folder = %name, "Batch cancelled, skipping folder");
                outcomes.push(FolderOutcome::failed(name, &err));
                continue;
            }

            reporter
                .report(format!("📁 [{}/{}] Processing: {}", index + 1, total, name))
                .await;

            let outcome = match self
                .process_folder(&resolver, &article, &codes, folder, request.only_images, reporter)
                .await
            {
                Ok(outcome) => {
                    reporter.report(format!("   ✅ {} processed", name)).await;
                    outcome
                }
                Err(e) => {
                    log_error(&name, &e);
                    reporter
                        .report(format!("   ❌ {}: {}", name, e.client_message()))
                        .await;
                    FolderOutcome::failed(name, &e)
                }
            };
            outcomes.push(outcome);
        }

        let report = BatchReport::from_outcomes(outcomes);
        reporter
            .report(format!(
                "✅ Done: {}/{} folders processed successfully",
                report.succeeded, report.total
            ))
            .await;
        tracing::info!(
            succeeded = report.succeeded,
            total = report.total,
            "Batch finished"
        );

        Ok(report)
    }

    #[tracing::instrument(skip_all, fields(folder = %folder.display_name))]
    async fn process_folder(
        &self,
        resolver: &RemoteTreeResolver,
        article: &str,
        codes: &[ProductCode],
        folder: FolderSubmission,
        only_images: bool,
        reporter: &ProgressReporter,
    ) -> Result<FolderOutcome, AppError> {
        let name = folder.display_name.clone();

        // Staging: write, normalize, list.
        let staging_dir = self.settings.staging_dir.clone();
        let staging_article = article.to_string();
        let (area, written, renamed, source_names) = run_blocking(move || {
            let area = StagingArea::new(staging_dir.as_deref(), &folder.display_name, &staging_article)?;
            let written = area.write_sources(&folder.files, only_images)?;
            let renamed = area.normalize_sources()?;
            let source_names = area.source_names()?;
            Ok((area, written, renamed, source_names))
        })
        .await?;

        if written.skipped > 0 {
            reporter
                .report(format!("   ⏭️ {} files skipped", written.skipped))
                .await;
        }
        reporter
            .report(format!("   💾 {} files saved", written.saved))
            .await;
        if !renamed.is_empty() {
            reporter
                .report(format!("   🔄 {} file names normalized", renamed.len()))
                .await;
        }

        // Classification of what actually landed on disk.
        let classification =
            FolderClassifier::classify_files(&name, source_names.iter().map(String::as_str));
        let verdict = FolderClassifier::validate_for_processing(&name, &classification)?;
        reporter
            .report(format!(
                "   📋 Article: {} | Country: {} | Color: {}",
                article,
                verdict.country.folder_name(),
                verdict.color
            ))
            .await;

        let destination = resolver
            .resolve(verdict.country, article, &verdict.color)
            .await?;

        // Fan-out.
        let jpeg_quality = self.settings.jpeg_quality;
        let fanout_codes = codes.to_vec();
        let (area, summary) = run_blocking(move || {
            let engine =
                FanoutEngine::new(area.output_dir(), area.converted_dir(), jpeg_quality);
            let sources = area.source_paths()?;
            let summary = engine.process(&sources, &fanout_codes);
            Ok((area, summary))
        })
        .await?;
        report_fanout(reporter, &summary).await;

        // Upload.
        let outputs = area.output_paths()?;
        let uploaded = self.upload_all(&outputs, &destination, reporter).await;
        reporter
            .report(format!("   ☁️ {}/{} files uploaded", uploaded, outputs.len()))
            .await;

        // Archive. Failures here never fail the folder.
        self.upload_archive(&area, &destination, reporter).await;

        tracing::info!(
            generated = summary.generated,
            uploaded = uploaded,
            png_converted = summary.png_converted,
            "Folder processed"
        );

        Ok(FolderOutcome::succeeded(
            name,
            summary.generated,
            uploaded,
            summary.png_converted,
        ))
    }

    /// Upload every file with bounded concurrency. Returns how many succeeded.
    async fn upload_all(
        &self,
        files: &[PathBuf],
        destination: &FolderId,
        reporter: &ProgressReporter,
    ) -> usize {
        let results: Vec<bool> = stream::iter(files.iter().cloned())
            .map(|path| {
                let store = self.store.clone();
                let reporter = reporter.clone();
                let destination = destination.clone();
                async move {
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    match store.upload_file(&path, &destination).await {
                        Ok(file_id) => {
                            tracing::debug!(file = %file_name, file_id = %file_id, "Uploaded");
                            reporter.report(format!("   ⬆️ Uploaded: {}", file_name)).await;
                            true
                        }
                        Err(e) => {
                            tracing::error!(file = %file_name, error = %e, "Upload failed");
                            reporter
                                .report(format!("   ❌ Upload failed: {}: {}", file_name, e))
                                .await;
                            false
                        }
                    }
                }
            })
            .buffer_unordered(self.settings.upload_concurrency)
            .collect()
            .await;

        results.into_iter().filter(|ok| *ok).count()
    }

    async fn upload_archive(
        &self,
        area: &StagingArea,
        destination: &FolderId,
        reporter: &ProgressReporter,
    ) {
        let output_dir = area.output_dir().to_path_buf();
        let archive_path = area.archive_path();
        let zip_target = archive_path.clone();

        let zipped = tokio::task::spawn_blocking(move || zip_directory(&output_dir, &zip_target))
            .await
            .map_err(|e| anyhow::anyhow!("ZIP task failed: {}", e))
            .and_then(|result| result);

        if let Err(e) = zipped {
            tracing::error!(error = %e, "Failed to build ZIP bundle");
            reporter.report(format!("   ❌ ZIP failed: {}", e)).await;
            return;
        }

        match self.store.upload_file(&archive_path, destination).await {
            Ok(_) => reporter.report("   📦 ZIP uploaded").await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to upload ZIP bundle");
                reporter.report(format!("   ❌ ZIP upload failed: {}", e)).await;
            }
        }
    }
}

async fn report_fanout(reporter: &ProgressReporter, summary: &FanoutSummary) {
    if summary.png_converted > 0 {
        reporter
            .report(format!("   🔄 {} PNG files converted to JPG", summary.png_converted))
            .await;
    }
    reporter
        .report(format!("   ✅ {} files generated", summary.generated))
        .await;
}

/// Log a failure at the level its kind asks for.
pub(crate) fn log_error(scope: &str, error: &AppError) {
    let error_code = error.error_code();
    let recoverable = error.is_recoverable();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(scope = %scope, error = %error, error_code, recoverable, "Request rejected");
        }
        LogLevel::Warn => {
            tracing::warn!(scope = %scope, error = %error, error_code, recoverable, "Step failed");
        }
        LogLevel::Error => {
            tracing::error!(
                scope = %scope,
                error = %error.detailed_message(),
                error_code,
                recoverable,
                "Step failed"
            );
        }
    }
}

/// Run filesystem/CPU work on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))?
}
