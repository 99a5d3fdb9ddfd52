//! Remote folder tools
//!
//! Operations on the published tree that are not part of batch processing:
//! listing the country folders, preparing an article folder in several
//! countries, and gathering every photo of an article into one ZIP.

use futures::stream::{self, StreamExt};
use photobatch_core::{AppError, Config, ErrorMetadata};
use photobatch_processing::create_zip_archive;
use photobatch_storage::{FileRef, FolderId, RemoteStore};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::orchestrator::log_error;
use crate::progress::{ProgressChannel, ProgressReporter, ProgressSink};
use crate::resolver::RemoteTreeResolver;

#[derive(Debug, Clone, Serialize)]
pub struct CountriesReport {
    pub success: bool,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticleFoldersReport {
    pub success: bool,
    pub countries_processed: usize,
    pub folders_created: usize,
    /// Requested countries with no folder under the root
    pub missing_countries: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatherReport {
    pub success: bool,
    pub message: String,
    pub photos_found: usize,
    pub photos_downloaded: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_name: Option<String>,
}

pub struct FolderTools {
    store: Arc<dyn RemoteStore>,
    resolver: RemoteTreeResolver,
    progress: Arc<dyn ProgressSink>,
    download_concurrency: usize,
    staging_dir: Option<PathBuf>,
}

impl FolderTools {
    pub fn new(store: Arc<dyn RemoteStore>, config: &Config, progress: Arc<dyn ProgressSink>) -> Self {
        FolderTools {
            resolver: RemoteTreeResolver::new(store.clone(), config.remote_root.clone()),
            store,
            progress,
            download_concurrency: config.upload_concurrency.max(1),
            staging_dir: config.staging_dir.clone(),
        }
    }

    /// Names of the country folders under the static root, sorted.
    pub async fn list_countries(&self) -> Result<CountriesReport, AppError> {
        let root = self.resolver.existing_root().await?;
        let mut countries: Vec<String> = self
            .store
            .list_child_folders(&root)
            .await?
            .into_iter()
            .map(|folder| folder.name)
            .collect();
        countries.sort();

        Ok(CountriesReport {
            success: true,
            countries,
        })
    }

    /// Find-or-create the (uppercased) article folder under each requested
    /// country folder. Countries without a folder are reported and skipped.
    pub async fn create_article_folders(
        &self,
        article: &str,
        countries: &[String],
    ) -> Result<ArticleFoldersReport, AppError> {
        let channel = ProgressChannel::spawn(self.progress.clone());
        let reporter = channel.reporter();
        let result = self
            .run_create_article_folders(article, countries, &reporter)
            .await;
        finish_progress(channel, reporter, &result).await;
        result
    }

    async fn run_create_article_folders(
        &self,
        article: &str,
        countries: &[String],
        reporter: &ProgressReporter,
    ) -> Result<ArticleFoldersReport, AppError> {
        let article = article.trim().to_uppercase();
        if article.is_empty() {
            return Err(AppError::Validation("Folder name is empty".to_string()));
        }
        let requested: Vec<&str> = countries
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .collect();
        if requested.is_empty() {
            return Err(AppError::Validation("No countries selected".to_string()));
        }

        reporter.report(format!("📁 Folder: {}", article)).await;
        reporter
            .report(format!("🌍 Countries selected: {}", requested.len()))
            .await;

        let root = self.resolver.existing_root().await?;
        let available: HashMap<String, FolderId> = self
            .store
            .list_child_folders(&root)
            .await?
            .into_iter()
            .map(|folder| (folder.name, folder.id))
            .collect();

        let mut report = ArticleFoldersReport {
            success: true,
            countries_processed: 0,
            folders_created: 0,
            missing_countries: Vec::new(),
        };

        for (index, country) in requested.iter().enumerate() {
            let Some(country_id) = available.get(*country) else {
                reporter
                    .report(format!("⚠️ Country not found: {}", country))
                    .await;
                report.missing_countries.push(country.to_string());
                continue;
            };

            reporter
                .report(format!("[{}/{}] {}", index + 1, requested.len(), country))
                .await;

            if self.store.find_folder(&article, Some(country_id)).await?.is_some() {
                reporter
                    .report(format!("   ✅ Folder '{}' already exists", article))
                    .await;
            } else {
                self.store.create_folder(&article, Some(country_id)).await?;
                tracing::info!(country = %country, article = %article, "Article folder created");
                reporter
                    .report(format!("   📁 Folder '{}' created", article))
                    .await;
                report.folders_created += 1;
            }
            report.countries_processed += 1;
        }

        reporter
            .report(format!("🎉 Done! {} folders created", report.folders_created))
            .await;
        Ok(report)
    }

    /// Collect every image below `<root>/<country>/<article>` (at any depth)
    /// into `<ARTICLE>.zip` and upload it into the article folder.
    pub async fn gather_photos(&self, country: &str, article: &str) -> Result<GatherReport, AppError> {
        let channel = ProgressChannel::spawn(self.progress.clone());
        let reporter = channel.reporter();
        let result = self.run_gather_photos(country, article, &reporter).await;
        finish_progress(channel, reporter, &result).await;
        result
    }

    async fn run_gather_photos(
        &self,
        country: &str,
        article: &str,
        reporter: &ProgressReporter,
    ) -> Result<GatherReport, AppError> {
        let country = country.trim().to_uppercase();
        let article = article.trim().to_uppercase();
        if country.is_empty() || article.is_empty() {
            return Err(AppError::Validation(
                "Country and folder names are required".to_string(),
            ));
        }

        reporter
            .report(format!("🌍 Processing: {} → {}", country, article))
            .await;

        let mut segments: Vec<&str> = self.resolver.root().segments().to_vec();
        segments.extend([country.as_str(), article.as_str()]);
        let article_id = self.resolver.resolve_existing(&segments).await?;

        let images = self.store.list_images_recursive(&article_id).await?;
        if images.is_empty() {
            reporter.report("⚠️ No photos found in this folder").await;
            return Ok(GatherReport {
                success: false,
                message: "No photos found".to_string(),
                photos_found: 0,
                photos_downloaded: 0,
                archive_name: None,
            });
        }
        reporter
            .report(format!("📸 Found {} photos", images.len()))
            .await;

        let scratch = match &self.staging_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                tempfile::Builder::new().prefix("photobatch-gather-").tempdir_in(dir)?
            }
            None => tempfile::Builder::new().prefix("photobatch-gather-").tempdir()?,
        };

        let downloaded = self
            .download_all(&images, scratch.path(), reporter)
            .await;
        if downloaded.is_empty() {
            return Err(AppError::Processing(
                "Could not download any photo".to_string(),
            ));
        }

        let archive_name = format!("{}.zip", article);
        let archive_path = scratch.path().join(&archive_name);
        reporter.report("📦 Creating ZIP archive...").await;
        let zip_files = downloaded.clone();
        let zip_target = archive_path.clone();
        tokio::task::spawn_blocking(move || create_zip_archive(&zip_files, &zip_target))
            .await
            .map_err(|e| AppError::Internal(format!("ZIP task failed: {}", e)))??;

        reporter.report("⬆️ Uploading ZIP...").await;
        self.store.upload_file(&archive_path, &article_id).await?;
        reporter.report("✅ ZIP uploaded").await;

        tracing::info!(
            country = %country,
            article = %article,
            photos = images.len(),
            downloaded = downloaded.len(),
            "Photos gathered"
        );

        Ok(GatherReport {
            success: true,
            message: "Photos gathered successfully".to_string(),
            photos_found: images.len(),
            photos_downloaded: downloaded.len(),
            archive_name: Some(archive_name),
        })
    }

    /// Download with bounded concurrency; returns the local paths that made it.
    async fn download_all(
        &self,
        images: &[FileRef],
        dest_dir: &Path,
        reporter: &ProgressReporter,
    ) -> Vec<PathBuf> {
        // Same-named photos from different subfolders would share one local
        // file; only the first by listing order is downloaded.
        let mut seen = HashSet::new();
        let planned: Vec<(usize, FileRef, PathBuf)> = images
            .iter()
            .enumerate()
            .filter_map(|(index, file)| {
                let dest = dest_dir.join(local_file_name(&file.name, index));
                if seen.insert(dest.clone()) {
                    Some((index, file.clone(), dest))
                } else {
                    tracing::debug!(file = %file.name, "Skipping photo with duplicate name");
                    None
                }
            })
            .collect();

        let total = images.len();
        let mut results: Vec<(usize, Option<PathBuf>)> = stream::iter(planned)
            .map(|(index, file, dest)| {
                let store = self.store.clone();
                let reporter = reporter.clone();
                async move {
                    reporter
                        .report(format!("⬇️ Downloading [{}/{}]: {}", index + 1, total, file.name))
                        .await;
                    match store.download_file(&file.id, &dest).await {
                        Ok(()) => (index, Some(dest)),
                        Err(e) => {
                            tracing::warn!(file = %file.name, error = %e, "Download failed");
                            (index, None)
                        }
                    }
                }
            })
            .buffer_unordered(self.download_concurrency)
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().filter_map(|(_, path)| path).collect()
    }
}

/// Report a failed tool call, then drain the progress channel.
async fn finish_progress<T>(
    channel: ProgressChannel,
    reporter: ProgressReporter,
    result: &Result<T, AppError>,
) {
    if let Err(e) = result {
        log_error("folder tool", e);
        reporter.report(format!("❌ {}", e.client_message())).await;
    }
    drop(reporter);
    channel.finish().await;
}

/// Plain local file name for a downloaded photo.
fn local_file_name(name: &str, index: usize) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(String::from)
        .unwrap_or_else(|| format!("photo_{}", index))
}
