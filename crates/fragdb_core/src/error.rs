//! Error types for archive operations.

use crate::archive::Mode;
use std::io;
use thiserror::Error;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Errors that can occur in archive operations.
///
/// Structural absence — a path missing from the index, a key missing
/// during traversal — is never an error; queries just omit the value.
/// These variants cover genuine failures only.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The archive file does not exist (open-for-read only).
    #[error("archive not found: {path}")]
    NotFound {
        /// The path that was requested.
        path: String,
    },

    /// A write operation was attempted on a handle in the wrong mode.
    #[error("operation `{operation}` not allowed in {mode} mode")]
    Mode {
        /// The operation that was attempted.
        operation: &'static str,
        /// The mode the handle was opened in.
        mode: Mode,
    },

    /// `add` was given a value that cannot be staged as records.
    #[error("cannot stage a {kind} as archive records; expected a map or a list of maps")]
    UnsupportedDocument {
        /// The kind of value that was rejected.
        kind: &'static str,
    },

    /// Unparseable bracket or slice syntax in a path or schema key.
    #[error("malformed path segment `{segment}`: {message}")]
    MalformedPath {
        /// The offending segment.
        segment: String,
        /// Description of the parse failure.
        message: String,
    },

    /// The file is not a fragdb archive, or its index is damaged.
    #[error("invalid archive format: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },

    /// Corrupt or truncated bytes at a claimed offset.
    #[error("codec error: {0}")]
    Codec(#[from] fragdb_codec::CodecError),

    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] fragdb_storage::StorageError),

    /// JSON rendering of a query result failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ArchiveError {
    /// Creates a malformed path error.
    pub fn malformed_path(segment: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedPath {
            segment: segment.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}
