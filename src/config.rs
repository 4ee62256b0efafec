//! Cache configuration
//!
//! `CacheOptions` controls when the table is written back, which codec is
//! used, and whether persistence failures are reported to the caller. Options
//! can be built in code or read from a JSON document.

use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::codec::{BincodeCodec, Codec, JsonCodec};

/// When a store writes its table back to the backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Persist the full table after every `put`
    #[default]
    WriteThrough,
    /// Only mark the table dirty; persist on `save()` or when dropped
    Deferred,
}

/// Selects one of the shipped codecs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecKind {
    #[default]
    Bincode,
    Json,
}

impl CodecKind {
    /// Creates the codec this kind names
    pub fn build(self) -> Box<dyn Codec> {
        match self {
            CodecKind::Bincode => Box::new(BincodeCodec),
            CodecKind::Json => Box::new(JsonCodec),
        }
    }
}

/// Options for a [`CacheFunction`](crate::CacheFunction) and its store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheOptions {
    pub write_policy: WritePolicy,
    /// Report persistence failures to the caller instead of only logging them
    pub strict_persistence: bool,
    /// Save a dirty table when the store is dropped
    pub save_on_drop: bool,
    pub codec: CodecKind,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            write_policy: WritePolicy::WriteThrough,
            strict_persistence: false,
            save_on_drop: true,
            codec: CodecKind::Bincode,
        }
    }
}

impl CacheOptions {
    /// Parses options from JSON; missing fields take their defaults
    ///
    /// # Example
    /// ```
    /// use cachefn::{CacheOptions, CodecKind, WritePolicy};
    ///
    /// let options = CacheOptions::from_json(r#"{"codec": "json", "write_policy": "deferred"}"#).unwrap();
    /// assert_eq!(options.codec, CodecKind::Json);
    /// assert_eq!(options.write_policy, WritePolicy::Deferred);
    /// assert!(options.save_on_drop);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Sets when a `put` reaches disk
    pub fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.write_policy = write_policy;
        self
    }

    /// Returns persistence failures as `CallError::Uncached` when `true`
    pub fn with_strict_persistence(mut self, strict: bool) -> Self {
        self.strict_persistence = strict;
        self
    }

    pub fn with_save_on_drop(mut self, save_on_drop: bool) -> Self {
        self.save_on_drop = save_on_drop;
        self
    }

    /// Picks the on-disk format
    pub fn with_codec(mut self, codec: CodecKind) -> Self {
        self.codec = codec;
        self
    }
}

/// Where `file_name` lives in the per-user cache directory of `app_name`
///
/// On Linux this resolves under `$XDG_CACHE_HOME` (usually `~/.cache`).
/// `None` when the platform reports no cache directory for the user.
pub fn default_cache_path(app_name: &str, file_name: &str) -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", app_name)?;
    Some(project_dirs.cache_dir().join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CacheOptions::default();
        assert_eq!(options.write_policy, WritePolicy::WriteThrough);
        assert!(!options.strict_persistence);
        assert!(options.save_on_drop);
        assert_eq!(options.codec, CodecKind::Bincode);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let options = CacheOptions::from_json(r#"{"strict_persistence": true}"#).unwrap();
        assert!(options.strict_persistence);
        assert_eq!(options.write_policy, WritePolicy::WriteThrough);
        assert!(options.save_on_drop);
    }

    #[test]
    fn test_from_json_rejects_unknown_codec() {
        assert!(CacheOptions::from_json(r#"{"codec": "yaml"}"#).is_err());
    }

    #[test]
    fn test_builders() {
        let options = CacheOptions::default()
            .with_write_policy(WritePolicy::Deferred)
            .with_save_on_drop(false)
            .with_codec(CodecKind::Json);
        assert_eq!(options.write_policy, WritePolicy::Deferred);
        assert!(!options.save_on_drop);
        assert_eq!(options.codec.build().name(), "json");
    }

    #[test]
    fn test_default_cache_path_contains_app_name() {
        if let Some(path) = default_cache_path("cachefn-test", "results.bin") {
            let path_str = path.to_string_lossy();
            assert!(path_str.contains("cachefn-test"));
            assert!(path_str.ends_with("results.bin"));
        }
        // Sandboxed users without a home resolve to None; nothing to check then
    }
}
