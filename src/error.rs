//! Error types for the cache engine

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`Codec`](crate::codec::Codec)
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary encode error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("binary decode error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /// The codec cannot represent the given value
    #[error("{0}")]
    Unsupported(String),
}

/// Errors raised by the cache layer
///
/// Errors from the wrapped function itself are never converted into a
/// `CacheError`; see [`CallError`](crate::CallError).
#[derive(Debug, Error)]
pub enum CacheError {
    /// An argument cannot take part in a cache key
    #[error("argument {argument} of kind '{kind}' is not hashable")]
    Unhashable { argument: String, kind: &'static str },

    /// The backing file exists but does not decode into a cache table
    #[error("cache file {} is corrupt: {source}", .path.display())]
    CorruptCache {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// `get` was called for a key the table does not hold
    #[error("no cache entry for key {0}")]
    KeyNotFound(String),

    /// Writing the table back to disk failed
    #[error("failed to persist cache to {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding the table for write-back failed
    #[error("failed to encode cache for {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: CodecError,
    },

    /// A result value cannot be stored with the configured codec
    #[error("value of kind '{kind}' is not serializable with the {codec} codec: {source}")]
    NotSerializable {
        kind: &'static str,
        codec: &'static str,
        #[source]
        source: CodecError,
    },

    /// The cache path exists but is a directory or other non-file
    #[error("{} exists and is not a file", .0.display())]
    NotAFile(PathBuf),

    /// Reading the backing file failed
    #[error("failed to read cache file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Returns true for failures to store a freshly computed result.
    ///
    /// These never turn a successful call into a failure unless strict
    /// persistence is configured.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            CacheError::Persistence { .. }
                | CacheError::Encode { .. }
                | CacheError::NotSerializable { .. }
        )
    }
}
