//! Error types for multiwatch-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading or writing JSON documents through [`crate::store`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failure, annotated with the path being accessed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not valid JSON (or not the expected shape).
    #[error("failed to parse JSON at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization failure on the write path.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors resolving the workspace layout. All of these are fatal at startup.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// `multi.json` does not exist at the expected path.
    #[error("repository manifest not found at {path}")]
    ManifestMissing { path: PathBuf },

    /// `multi.json` exists but is not valid JSON or lacks a `repos` list.
    #[error("repository manifest at {path} is malformed: {reason}")]
    ManifestMalformed { path: PathBuf, reason: String },

    /// A repository entry whose url has no usable final path segment.
    #[error("repository descriptor '{url}' has no folder name")]
    DescriptorInvalid { url: String },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
