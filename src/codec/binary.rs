//! Compact binary codec built on bincode

use super::Codec;
use crate::cache::CacheTable;
use crate::error::CodecError;

/// Default codec: bincode's standard configuration over serde
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl Codec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode(&self, table: &CacheTable) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serde::encode_to_vec(
            table,
            bincode::config::standard(),
        )?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<CacheTable, CodecError> {
        let (table, bytes_read): (CacheTable, usize) =
            bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;

        // A shorter table followed by garbage is not the table that was written
        if bytes_read != bytes.len() {
            return Err(CodecError::Unsupported(format!(
                "{} trailing bytes after cache table",
                bytes.len() - bytes_read
            )));
        }

        Ok(table)
    }
}
