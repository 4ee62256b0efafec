//! Disk-persistent function result cache
//!
//! Memoizes the results of deterministic functions in a file so they
//! survive across process runs. Arguments are turned into a [`CacheKey`]
//! (positional values in order, keyword values sorted by name), looked up
//! in an in-memory table loaded once from disk, and on a miss the wrapped
//! function runs and its result is written back.
//!
//! ```no_run
//! use cachefn::{args, cachefunction, Args, Value};
//! use std::convert::Infallible;
//!
//! fn slow_square(args: &Args) -> Result<Value, Infallible> {
//!     let n = args.get(0).and_then(Value::as_i64).unwrap_or(0);
//!     Ok(Value::Int(n * n))
//! }
//!
//! let mut square = cachefunction("square.bin")(slow_square);
//! assert_eq!(square.call(&args![12]).unwrap(), Value::Int(144));
//! ```

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub mod value;

pub use cache::{cachefunction, CacheFunction, CacheStats, CacheStore, CacheTable, Cached, CallError};
pub use codec::{BincodeCodec, Codec, JsonCodec};
pub use config::{default_cache_path, CacheOptions, CodecKind, WritePolicy};
pub use error::{CacheError, CodecError};
pub use key::{CacheKey, KeyBuilder};
pub use value::{Args, Value};
