//! Error types for ctxsum.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using ctxsum's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during build-context operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred during file operations.
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// No entry exists at the resolved path.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// The path escapes the context root or is otherwise malformed.
    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    /// The archive stream could not be fully materialized.
    #[error("Failed to materialize build context: {source}")]
    Construction { source: std::io::Error },

    /// The entry is a kind the digest does not cover (socket, FIFO, device).
    #[error("Unsupported entry type: {path}")]
    UnsupportedEntry { path: PathBuf },

    /// Unknown digest version tag.
    #[error("Unsupported digest version: {tag}")]
    UnsupportedVersion { tag: String },

    /// Invalid digest format or encoding.
    #[error("Invalid digest: {reason}")]
    InvalidDigest { reason: String },
}

impl Error {
    /// Create a NotFound error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Error::NotFound { path: path.into() }
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Construction error.
    pub fn construction(source: std::io::Error) -> Self {
        Error::Construction { source }
    }

    /// Create an UnsupportedEntry error.
    pub fn unsupported_entry(path: impl Into<PathBuf>) -> Self {
        Error::UnsupportedEntry { path: path.into() }
    }

    /// Create an UnsupportedVersion error.
    pub fn unsupported_version(tag: impl Into<String>) -> Self {
        Error::UnsupportedVersion { tag: tag.into() }
    }

    /// Create an InvalidDigest error.
    pub fn invalid_digest(reason: impl Into<String>) -> Self {
        Error::InvalidDigest {
            reason: reason.into(),
        }
    }

    /// True if the error reports a missing path.
    ///
    /// Callers check existence through this before deciding whether a build
    /// step can reuse cached output, so NotFound must stay distinguishable
    /// from other I/O failures.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Io { source } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Wrap an I/O error observed at `path`, promoting NotFound.
    pub(crate) fn from_io_at(source: std::io::Error, path: &Path) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::not_found(path)
        } else {
            Error::Io { source }
        }
    }
}
