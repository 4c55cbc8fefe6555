//! Error types for artifact upload.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while uploading artifacts.
#[derive(Debug, Error)]
pub enum UploadError {
    /// A required environment variable is not set.
    #[error("{0} environment variable is required")]
    MissingConfig(&'static str),

    /// The object store failed or rejected the upload.
    #[error("Upload of {key} failed: {message}")]
    S3 {
        /// Object key.
        key: String,
        /// Error chain reported by the client.
        message: String,
    },

    /// The source directory does not exist.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
