//! Configuration module
//!
//! Settings are read from the environment (and an optional `.env` file). The
//! CLI may override individual values after loading.

use std::env;
use std::path::PathBuf;

use crate::storage_types::StoreBackend;

const DEFAULT_REMOTE_ROOT: &str = "LEBENGOOD/FOTOS/FOTOS ORDENADAS";
const UPLOAD_CONCURRENCY: usize = 4;
const JPEG_QUALITY: u8 = 95;

/// The fixed three-segment prefix (root, category, sub-category) under which
/// the country/article/color tree lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteRoot {
    pub root: String,
    pub category: String,
    pub subcategory: String,
}

impl RemoteRoot {
    /// Parse a `/`-separated path with exactly three non-empty segments.
    pub fn parse(path: &str) -> Result<Self, anyhow::Error> {
        let segments: Vec<&str> = path
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            [root, category, subcategory] => Ok(RemoteRoot {
                root: root.to_string(),
                category: category.to_string(),
                subcategory: subcategory.to_string(),
            }),
            _ => Err(anyhow::anyhow!(
                "REMOTE_ROOT_PATH must have exactly 3 segments, got {}: '{}'",
                segments.len(),
                path
            )),
        }
    }

    pub fn segments(&self) -> [&str; 3] {
        [&self.root, &self.category, &self.subcategory]
    }

    pub fn display_path(&self) -> String {
        self.segments().join("/")
    }
}

impl Default for RemoteRoot {
    fn default() -> Self {
        RemoteRoot {
            root: "LEBENGOOD".to_string(),
            category: "FOTOS".to_string(),
            subcategory: "FOTOS ORDENADAS".to_string(),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub store_backend: StoreBackend,
    pub local_store_path: Option<PathBuf>,
    pub remote_root: RemoteRoot,
    /// Upper bound on concurrent uploads/downloads within one folder
    pub upload_concurrency: usize,
    pub jpeg_quality: u8,
    /// Parent directory for per-folder staging areas (system temp dir when unset)
    pub staging_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            environment: "development".to_string(),
            store_backend: StoreBackend::Local,
            local_store_path: None,
            remote_root: RemoteRoot::default(),
            upload_concurrency: UPLOAD_CONCURRENCY,
            jpeg_quality: JPEG_QUALITY,
            staging_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let store_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => value.parse::<StoreBackend>()?,
            None => StoreBackend::Local,
        };

        let remote_root = RemoteRoot::parse(
            &lookup("REMOTE_ROOT_PATH").unwrap_or_else(|| DEFAULT_REMOTE_ROOT.to_string()),
        )?;

        let upload_concurrency = lookup("UPLOAD_CONCURRENCY")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(UPLOAD_CONCURRENCY);

        let jpeg_quality = lookup("JPEG_QUALITY")
            .and_then(|v| v.trim().parse::<u8>().ok())
            .unwrap_or(JPEG_QUALITY);

        let config = Config {
            environment,
            store_backend,
            local_store_path: lookup("LOCAL_STORE_PATH").map(PathBuf::from),
            remote_root,
            upload_concurrency,
            jpeg_quality,
            staging_dir: lookup("STAGING_DIR").map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.upload_concurrency == 0 {
            return Err(anyhow::anyhow!("UPLOAD_CONCURRENCY must be at least 1"));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(anyhow::anyhow!(
                "JPEG_QUALITY must be between 1 and 100, got {}",
                self.jpeg_quality
            ));
        }

        Ok(())
    }
}
