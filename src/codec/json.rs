//! Human-readable JSON codec
//!
//! Tables are written as a JSON array of `[key, value]` pairs so that
//! composite keys survive the round trip.

use super::Codec;
use crate::cache::CacheTable;
use crate::error::CodecError;
use crate::value::Value;

/// Pretty-printed JSON; floats must be finite
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

/// Finds a float JSON cannot represent
fn find_non_finite(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) if !f.is_finite() => Some(*f),
        Value::Tuple(items) | Value::List(items) => items.iter().find_map(find_non_finite),
        Value::Map(pairs) => pairs
            .iter()
            .find_map(|(k, v)| find_non_finite(k).or_else(|| find_non_finite(v))),
        _ => None,
    }
}

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, table: &CacheTable) -> Result<Vec<u8>, CodecError> {
        // serde_json writes non-finite floats as null, which does not decode
        for (key, value) in table.iter() {
            let key_values = key
                .positional()
                .iter()
                .chain(key.keyword().iter().map(|(_, v)| v));
            for checked in key_values.chain(std::iter::once(value)) {
                self.check(checked)?;
            }
        }
        Ok(serde_json::to_vec_pretty(table)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<CacheTable, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn check(&self, value: &Value) -> Result<(), CodecError> {
        match find_non_finite(value) {
            Some(f) => Err(CodecError::Unsupported(format!(
                "JSON cannot represent the float {}",
                f
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::key::KeyBuilder;
    use crate::value::Args;

    #[test]
    fn test_table_survives_encode_decode() {
        let mut table = CacheTable::new();
        table.insert(KeyBuilder::build(&args![1, 2]).unwrap(), Value::Int(3));
        table.insert(
            KeyBuilder::build(&Args::new().arg((1, "a")).kwarg("cat", "tabby")).unwrap(),
            Value::Map(vec![(Value::from("k"), Value::Bytes(vec![1, 2]))]),
        );

        let bytes = JsonCodec.encode(&table).unwrap();
        assert_eq!(JsonCodec.decode(&bytes).unwrap(), table);
    }

    #[test]
    fn test_output_is_readable_json() {
        let mut table = CacheTable::new();
        table.insert(KeyBuilder::build(&args!["tabby"]).unwrap(), Value::Int(42));

        let text = String::from_utf8(JsonCodec.encode(&table).unwrap()).unwrap();
        assert!(text.contains("\"tabby\""));
        assert!(text.contains("42"));
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        assert!(matches!(
            JsonCodec.decode(b"not json"),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn test_arbitrary_floats_survive_encode_decode() {
        // xorshift over raw bit patterns, keeping only finite floats
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut table = CacheTable::new();
        while table.len() < 5_000 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let f = f64::from_bits(state);
            if f.is_finite() {
                table.insert(
                    KeyBuilder::build(&Args::new().arg(f).kwarg("scale", f / 3.0)).unwrap(),
                    Value::Float(f * 0.1),
                );
            }
        }

        let decoded = JsonCodec.decode(&JsonCodec.encode(&table).unwrap()).unwrap();

        for (key, value) in table.iter() {
            let restored = decoded.get(key).expect("Float key should match exactly");
            let (Value::Float(a), Value::Float(b)) = (value, restored) else {
                panic!("expected float values, got {:?}", restored);
            };
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_encode_rejects_non_finite_key() {
        let mut table = CacheTable::new();
        table.insert(KeyBuilder::build(&args![f64::NEG_INFINITY]).unwrap(), Value::Int(1));

        assert!(matches!(
            JsonCodec.encode(&table),
            Err(CodecError::Unsupported(_))
        ));
    }

    #[test]
    fn test_rejects_nested_non_finite_float() {
        let value = Value::List(vec![Value::Int(1), Value::Float(f64::NAN)]);
        assert!(JsonCodec.check(&value).is_err());
        assert!(JsonCodec.check(&Value::Float(1.5)).is_ok());
    }
}
