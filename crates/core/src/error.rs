//! Error types for lambo-core
//!
//! Every failure is classified into one of a few kinds so callers can react
//! without inspecting the cause chain. Each variant carries the path or
//! bucket/key it relates to.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for lambo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause attached to backend errors
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    /// A local path is missing, is not what was expected, or cannot be read
    #[error("{message}")]
    Filesystem {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The storage service rejected a request
    #[error("{message}")]
    Backend {
        bucket: String,
        key: Option<String>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The requested key does not exist in the bucket
    #[error("no such key {key} in bucket {bucket}")]
    NotFound { bucket: String, key: String },

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),
}

/// Classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Filesystem,
    Backend,
    NotFound,
    Config,
}

impl ErrorKind {
    /// Stable machine-readable code for this kind
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Filesystem => "FS_ERROR",
            ErrorKind::Backend => "AWS_ERROR",
            ErrorKind::NotFound => "AWS_NO_SUCH_KEY",
            ErrorKind::Config => "CONFIG_ERROR",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Error {
    /// Filesystem error caused by an I/O failure on `path`
    pub fn filesystem(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::Filesystem {
            path: path.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Filesystem error with no underlying I/O cause (e.g. wrong file type)
    pub fn filesystem_msg(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Filesystem {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Backend error for a bucket-level request
    pub fn backend(bucket: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Backend {
            bucket: bucket.into(),
            key: None,
            message: message.into(),
            source: None,
        }
    }

    /// Backend error for a request on a specific key, wrapping its cause
    pub fn backend_key(
        bucket: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Error::Backend {
            bucket: bucket.into(),
            key: Some(key.into()),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Filesystem { .. } => ErrorKind::Filesystem,
            Error::Backend { .. } => ErrorKind::Backend,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Local path this error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::Filesystem { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Object key this error refers to, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::Backend { key, .. } => key.as_deref(),
            Error::NotFound { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Bucket this error refers to, if any
    pub fn bucket(&self) -> Option<&str> {
        match self {
            Error::Backend { bucket, .. } | Error::NotFound { bucket, .. } => Some(bucket),
            _ => None,
        }
    }
}
