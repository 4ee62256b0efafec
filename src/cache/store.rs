//! Cache store that mirrors an in-memory table to one backing file
//!
//! The table is read from disk once, on the first `load()`, and is
//! authoritative for the rest of the store's life. Every write-back encodes
//! the complete table and replaces the backing file atomically.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::CacheTable;
use crate::codec::{BincodeCodec, Codec};
use crate::config::{CacheOptions, WritePolicy};
use crate::error::CacheError;
use crate::key::CacheKey;
use crate::value::Value;

/// Owns a [`CacheTable`] and the path of the file that persists it
#[derive(Debug)]
pub struct CacheStore {
    /// Backing file
    path: PathBuf,
    codec: Box<dyn Codec>,
    /// Empty until `load()` has read the backing file
    table: CacheTable,
    loaded: bool,
    /// Table holds changes not yet written to disk
    dirty: bool,
    write_policy: WritePolicy,
    save_on_drop: bool,
}

impl CacheStore {
    /// Creates an unloaded store using the default binary codec
    ///
    /// Does not touch the filesystem; the file is read on the first `load()`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_codec(path, BincodeCodec)
    }

    /// Creates an unloaded store with a custom codec
    pub fn with_codec(path: impl Into<PathBuf>, codec: impl Codec + 'static) -> Self {
        Self::with_boxed_codec(path.into(), Box::new(codec), &CacheOptions::default())
    }

    /// Creates an unloaded store configured from `options`
    pub fn from_options(path: impl Into<PathBuf>, options: &CacheOptions) -> Self {
        Self::with_boxed_codec(path.into(), options.codec.build(), options)
    }

    /// Shared constructor for the public builders
    fn with_boxed_codec(path: PathBuf, codec: Box<dyn Codec>, options: &CacheOptions) -> Self {
        Self {
            path,
            codec,
            table: CacheTable::new(),
            loaded: false,
            dirty: false,
            write_policy: options.write_policy,
            save_on_drop: options.save_on_drop,
        }
    }

    /// Sets when the table is written back
    pub fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.write_policy = write_policy;
        self
    }

    /// Sets whether a dirty table is saved when the store is dropped
    pub fn with_save_on_drop(mut self, save_on_drop: bool) -> Self {
        self.save_on_drop = save_on_drop;
        self
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the codec used for the backing file
    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }

    /// Current write-back policy
    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    /// Returns true once the backing file has been read
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns true if the table has changes not yet on disk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of entries in memory
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns true if the in-memory table has no entries
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Keys currently held in memory, in no particular order
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.table.keys()
    }

    /// The in-memory table (empty before `load()`)
    pub fn table(&self) -> &CacheTable {
        &self.table
    }

    /// Reads the backing file into memory; later calls are no-ops
    ///
    /// # Returns
    /// * `Ok(())` if the table is loaded; a missing or empty file loads as an empty table
    /// * `Err(CacheError::NotAFile)` if the path is a directory or other non-file
    /// * `Err(CacheError::CorruptCache)` if the file does not decode
    /// * `Err(CacheError::Read)` on any other I/O failure
    pub fn load(&mut self) -> Result<(), CacheError> {
        if self.loaded {
            return Ok(());
        }

        self.table = read_table(&self.path, self.codec.as_ref())?;
        self.loaded = true;

        info!(
            path = %self.path.display(),
            entries = self.table.len(),
            codec = self.codec.name(),
            "cache loaded"
        );
        Ok(())
    }

    /// Returns true if the in-memory table holds `key`
    ///
    /// Never reads the backing file; an unloaded store holds nothing.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.table.contains(key)
    }

    /// Returns the value stored for `key`
    ///
    /// Only valid after `contains(key)` returned true.
    pub fn get(&self, key: &CacheKey) -> Result<&Value, CacheError> {
        self.table
            .get(key)
            .ok_or_else(|| CacheError::KeyNotFound(key.to_string()))
    }

    /// Inserts or overwrites an entry and, under write-through, persists the table
    ///
    /// An entry whose key or value the codec rejects is not inserted. Once
    /// inserted, the entry stays in memory even if the write-back fails.
    pub fn put(&mut self, key: CacheKey, value: Value) -> Result<(), CacheError> {
        let key_values = key
            .positional()
            .iter()
            .chain(key.keyword().iter().map(|(_, v)| v));
        for checked in key_values.chain(std::iter::once(&value)) {
            self.check_value(checked)?;
        }

        self.load()?;
        self.table.insert(key, value);
        self.dirty = true;
        self.write_back()
    }

    /// Removes an entry, returning its value
    pub fn remove(&mut self, key: &CacheKey) -> Result<Option<Value>, CacheError> {
        self.load()?;
        let removed = self.table.remove(key);
        if removed.is_some() {
            self.dirty = true;
            self.write_back()?;
        }
        Ok(removed)
    }

    /// Drops every entry
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.load()?;
        self.table.clear();
        self.dirty = true;
        self.write_back()
    }

    /// Persists the table if it has unsaved changes
    pub fn save(&mut self) -> Result<(), CacheError> {
        if !self.dirty {
            return Ok(());
        }
        self.force_save()
    }

    /// Persists the table regardless of the dirty flag
    pub fn force_save(&mut self) -> Result<(), CacheError> {
        // Never overwrite entries on disk with a table that was not read
        self.load()?;

        let bytes = self
            .codec
            .encode(&self.table)
            .map_err(|source| CacheError::Encode {
                path: self.path.clone(),
                source,
            })?;

        write_atomic(&self.path, &bytes).map_err(|source| CacheError::Persistence {
            path: self.path.clone(),
            source,
        })?;

        self.dirty = false;
        debug!(
            path = %self.path.display(),
            entries = self.table.len(),
            bytes = bytes.len(),
            "cache saved"
        );
        Ok(())
    }

    /// Fails with `NotSerializable` if the codec cannot represent `value`
    fn check_value(&self, value: &Value) -> Result<(), CacheError> {
        self.codec
            .check(value)
            .map_err(|source| CacheError::NotSerializable {
                kind: value.kind(),
                codec: self.codec.name(),
                source,
            })
    }

    /// Persists under write-through; defers otherwise
    fn write_back(&mut self) -> Result<(), CacheError> {
        match self.write_policy {
            WritePolicy::WriteThrough => self.save(),
            WritePolicy::Deferred => Ok(()),
        }
    }
}

impl Drop for CacheStore {
    fn drop(&mut self) {
        if self.save_on_drop && self.dirty {
            if let Err(e) = self.save() {
                warn!(path = %self.path.display(), error = %e, "failed to save cache on drop");
            }
        }
    }
}

/// Reads and decodes a backing file
fn read_table(path: &Path, codec: &dyn Codec) -> Result<CacheTable, CacheError> {
    match fs::metadata(path) {
        Ok(meta) if !meta.is_file() => return Err(CacheError::NotAFile(path.to_path_buf())),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no cache file; starting empty");
            return Ok(CacheTable::new());
        }
        Err(source) => {
            return Err(CacheError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let bytes = fs::read(path).map_err(|source| CacheError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if bytes.is_empty() {
        return Ok(CacheTable::new());
    }

    codec.decode(&bytes).map_err(|source| CacheError::CorruptCache {
        path: path.to_path_buf(),
        source,
    })
}

/// Sibling path the table is staged at before being renamed into place
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("cache"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `bytes` to a staging file, then renames it over `path`
///
/// A reader sees either the previous file or the new one, never a mix.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path(path);
    let result = File::create(&staging)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&staging, path));

    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}
