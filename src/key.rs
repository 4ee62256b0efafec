//! Cache key construction
//!
//! A key is the positional arguments in call order followed by the keyword
//! arguments sorted by name, so `f(a=1, b=2)` and `f(b=2, a=1)` share an
//! entry while `f(1, 2)` and `f(2, 1)` do not.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::value::{Args, Value};

/// Lookup key derived from the arguments of one call
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl CacheKey {
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Keyword arguments, sorted by name
    pub fn keyword(&self) -> &[(String, Value)] {
        &self.keyword
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.positional.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", value)?;
        }
        for (i, (name, value)) in self.keyword.iter().enumerate() {
            if i > 0 || !self.positional.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

/// Derives [`CacheKey`]s from call arguments
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyBuilder;

impl KeyBuilder {
    /// Builds the key for a call
    ///
    /// # Errors
    /// * `CacheError::Unhashable` if any positional or keyword value is a
    ///   list or map, or a tuple containing one
    pub fn build(args: &Args) -> Result<CacheKey, CacheError> {
        Self::from_parts(args.positional(), args.keyword())
    }

    /// Builds a key from raw positional and keyword slices
    ///
    /// A keyword name given more than once keeps its last value.
    pub fn from_parts(
        positional: &[Value],
        keyword: &[(String, Value)],
    ) -> Result<CacheKey, CacheError> {
        for (index, value) in positional.iter().enumerate() {
            if let Some(kind) = value.unhashable_kind() {
                return Err(CacheError::Unhashable {
                    argument: format!("#{}", index),
                    kind,
                });
            }
        }

        let sorted: BTreeMap<&str, &Value> = keyword
            .iter()
            .map(|(name, value)| (name.as_str(), value))
            .collect();

        let mut keyword = Vec::with_capacity(sorted.len());
        for (name, value) in sorted {
            if let Some(kind) = value.unhashable_kind() {
                return Err(CacheError::Unhashable {
                    argument: name.to_string(),
                    kind,
                });
            }
            keyword.push((name.to_string(), value.clone()));
        }

        Ok(CacheKey {
            positional: positional.to_vec(),
            keyword,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;

    #[test]
    fn test_keyword_order_does_not_matter() {
        let a = KeyBuilder::build(&Args::new().kwarg("a", 1).kwarg("b", 2)).unwrap();
        let b = KeyBuilder::build(&Args::new().kwarg("b", 2).kwarg("a", 1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_positional_order_matters() {
        let a = KeyBuilder::build(&args![1, 2]).unwrap();
        let b = KeyBuilder::build(&args![2, 1]).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_positional_and_keyword_are_distinct() {
        let positional = KeyBuilder::build(&args![1]).unwrap();
        let keyword = KeyBuilder::build(&Args::new().kwarg("a", 1)).unwrap();
        assert_ne!(positional, keyword);
    }

    #[test]
    fn test_differing_values_give_different_keys() {
        let a = KeyBuilder::build(&Args::new().arg(1).kwarg("name", "David")).unwrap();
        let b = KeyBuilder::build(&Args::new().arg(1).kwarg("name", "Ada")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_keywords_are_sorted() {
        let key = KeyBuilder::build(&Args::new().kwarg("frog", "prince").kwarg("cat", "tabby")).unwrap();
        let names: Vec<&str> = key.keyword().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["cat", "frog"]);
    }

    #[test]
    fn test_repeated_keyword_keeps_last_value() {
        let key = KeyBuilder::build(&Args::new().kwarg("a", 1).kwarg("a", 2)).unwrap();
        assert_eq!(key.keyword(), &[("a".to_string(), Value::Int(2))]);
    }

    #[test]
    fn test_unhashable_positional_argument() {
        let args = Args::new().arg(1).arg(Value::List(vec![Value::Int(2)]));
        match KeyBuilder::build(&args) {
            Err(CacheError::Unhashable { argument, kind }) => {
                assert_eq!(argument, "#1");
                assert_eq!(kind, "list");
            }
            other => panic!("expected Unhashable, got {:?}", other),
        }
    }

    #[test]
    fn test_unhashable_keyword_argument() {
        let args = Args::new().kwarg("opts", Value::Map(vec![]));
        match KeyBuilder::build(&args) {
            Err(CacheError::Unhashable { argument, kind }) => {
                assert_eq!(argument, "opts");
                assert_eq!(kind, "map");
            }
            other => panic!("expected Unhashable, got {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let key = KeyBuilder::build(&Args::new().arg(1).arg("x").kwarg("b", 2)).unwrap();
        assert_eq!(key.to_string(), "(1, \"x\", b=2)");
    }
}
