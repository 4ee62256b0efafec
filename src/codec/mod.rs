//! Pluggable serialization of cache tables
//!
//! The store hands the whole table to a [`Codec`] on every write-back and
//! asks it to rebuild a table from the backing file's bytes on load. New
//! on-disk formats only need a new `Codec` implementation.

mod binary;
mod json;

pub use binary::BincodeCodec;
pub use json::JsonCodec;

use std::fmt;

use crate::cache::CacheTable;
use crate::error::CodecError;
use crate::value::Value;

/// Converts a [`CacheTable`] to and from the bytes of a backing file
pub trait Codec: fmt::Debug {
    /// Short name used in logs and error messages
    fn name(&self) -> &'static str;

    fn encode(&self, table: &CacheTable) -> Result<Vec<u8>, CodecError>;

    fn decode(&self, bytes: &[u8]) -> Result<CacheTable, CodecError>;

    /// Rejects values this codec cannot represent, before they enter a table
    fn check(&self, _value: &Value) -> Result<(), CodecError> {
        Ok(())
    }
}
