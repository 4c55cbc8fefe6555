//! Directory-to-bucket upload of chart artifacts.

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::{
    Result,
    config::UploadConfig,
    error::UploadError,
    store::{ObjectMeta, ObjectStore},
};

/// `Cache-Control` applied to every upload.
pub const CACHE_CONTROL: &str = "max-age=600";

/// Canned ACL applied to every upload.
pub const PUBLIC_READ: &str = "public-read";

/// Value of the `source` metadata entry.
pub const METADATA_SOURCE: &str = "bitcoin_treasury_analysis";

/// MIME type for an artifact extension.
#[must_use]
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "json" => "application/json",
        "csv" => "text/csv",
        "html" => "text/html",
        _ => "application/octet-stream",
    }
}

/// A successfully uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    /// Local path.
    pub local_path: PathBuf,
    /// File name.
    pub filename: String,
    /// Object key.
    pub key: String,
    /// Public URL.
    pub url: String,
}

/// A file that could not be uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    /// Local path.
    pub local_path: PathBuf,
    /// File name.
    pub filename: String,
    /// Error message.
    pub error: String,
}

/// Outcome of uploading one company's artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    /// Company identifier.
    pub company: String,
    /// Target bucket.
    pub bucket: String,
    /// Upload date, `YYYY-MM-DD`.
    pub upload_date: String,
    /// Files uploaded.
    pub uploaded: Vec<UploadedFile>,
    /// Files that failed.
    pub failed: Vec<FailedFile>,
}

impl UploadReport {
    /// Number of files uploaded.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.uploaded.len()
    }

    /// Number of files that failed.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// Whether any file failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Outcome of uploading several companies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MultiUploadReport {
    /// Per-company reports, in processing order.
    pub reports: Vec<UploadReport>,
    /// Companies whose upload could not start, with the reason.
    pub errors: Vec<(String, String)>,
}

impl MultiUploadReport {
    /// Files uploaded across all companies.
    #[must_use]
    pub fn total_success(&self) -> usize {
        self.reports.iter().map(UploadReport::success_count).sum()
    }

    /// Files failed across all companies.
    #[must_use]
    pub fn total_failure(&self) -> usize {
        self.reports.iter().map(UploadReport::failure_count).sum()
    }
}

/// Uploads artifact directories through an [`ObjectStore`].
#[derive(Debug)]
pub struct Uploader<S> {
    store: S,
    config: UploadConfig,
    extension: String,
}

impl<S: ObjectStore> Uploader<S> {
    /// Create an uploader for files with `extension`.
    pub fn new(store: S, config: UploadConfig, extension: impl Into<String>) -> Self {
        Self {
            store,
            config,
            extension: extension.into(),
        }
    }

    /// The target configuration.
    pub const fn config(&self) -> &UploadConfig {
        &self.config
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }

    /// Files in `dir` with the configured extension, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is not a readable directory.
    pub async fn artifacts(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(UploadError::NotADirectory(dir.to_path_buf()));
        }
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if self.matches_extension(&path) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Upload every artifact in `dir` under the company's key prefix.
    ///
    /// Per-file failures are recorded in the report and never abort the
    /// remaining uploads. An empty directory yields an empty report.
    ///
    /// # Errors
    ///
    /// Returns an error only if `dir` cannot be listed.
    pub async fn upload_company_charts(&self, dir: &Path, company: &str) -> Result<UploadReport> {
        let files = self.artifacts(dir).await?;
        let upload_date = Local::now().date_naive().to_string();
        let mut report = UploadReport {
            company: company.to_string(),
            bucket: self.config.bucket.clone(),
            upload_date: upload_date.clone(),
            ..UploadReport::default()
        };

        if files.is_empty() {
            tracing::info!(
                dir = %dir.display(),
                extension = %self.extension,
                "no artifacts to upload"
            );
            return Ok(report);
        }
        tracing::info!(
            company,
            bucket = %self.config.bucket,
            count = files.len(),
            "uploading artifacts"
        );

        let meta = ObjectMeta {
            content_type: content_type_for(&self.extension).to_string(),
            cache_control: CACHE_CONTROL.to_string(),
            acl: PUBLIC_READ.to_string(),
            metadata: vec![
                ("company".to_string(), company.to_string()),
                ("upload_date".to_string(), upload_date),
                ("source".to_string(), METADATA_SOURCE.to_string()),
            ],
        };

        for path in files {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let key = self.config.key_for(company, &filename);

            let outcome = match tokio::fs::read(&path).await {
                Ok(body) => self.store.put(&key, body, &meta).await,
                Err(e) => Err(e.into()),
            };

            match outcome {
                Ok(()) => {
                    let url = self.config.public_url(&key);
                    tracing::info!(file = %filename, url = %url, "uploaded");
                    report.uploaded.push(UploadedFile {
                        local_path: path,
                        filename,
                        key,
                        url,
                    });
                }
                Err(e) => {
                    tracing::warn!(file = %filename, error = %e, "upload failed");
                    report.failed.push(FailedFile {
                        local_path: path,
                        filename,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            company,
            success = report.success_count(),
            failure = report.failure_count(),
            "upload finished"
        );
        Ok(report)
    }

    /// Upload several company directories under `base_dir`.
    ///
    /// With `companies` unset, every subdirectory containing at least one
    /// artifact is uploaded, using the directory name as the company.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_dir` cannot be listed.
    pub async fn upload_multiple(
        &self,
        base_dir: &Path,
        companies: Option<&[String]>,
    ) -> Result<MultiUploadReport> {
        let names: Vec<String> = match companies {
            Some(names) => names.to_vec(),
            None => {
                if !base_dir.is_dir() {
                    return Err(UploadError::NotADirectory(base_dir.to_path_buf()));
                }
                let mut entries = tokio::fs::read_dir(base_dir).await?;
                let mut names = Vec::new();
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if path.is_dir() && !self.artifacts(&path).await?.is_empty() {
                        names.push(entry.file_name().to_string_lossy().into_owned());
                    }
                }
                names.sort();
                names
            }
        };

        let mut result = MultiUploadReport::default();
        for name in names {
            match self.upload_company_charts(&base_dir.join(&name), &name).await {
                Ok(report) => result.reports.push(report),
                Err(e) => {
                    tracing::warn!(company = %name, error = %e, "company upload skipped");
                    result.errors.push((name, e.to_string()));
                }
            }
        }
        Ok(result)
    }
}
