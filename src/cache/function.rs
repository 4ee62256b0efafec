//! Decorator surface: wraps a function so calls consult the cache first

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use super::CacheStore;
use crate::config::CacheOptions;
use crate::error::CacheError;
use crate::key::KeyBuilder;
use crate::value::{Args, Value};

/// Error returned by a cached call
#[derive(Debug, Error)]
pub enum CallError<E> {
    /// The wrapped function failed; nothing was cached
    #[error(transparent)]
    Function(E),

    /// The call could not be served through the cache
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The result was computed but could not be stored
    ///
    /// Only returned with strict persistence, or for failures other than
    /// persistence. The computed value is handed back.
    #[error("result computed but not cached: {source}")]
    Uncached {
        value: Value,
        #[source]
        source: CacheError,
    },
}

impl<E> CallError<E> {
    /// Returns the computed value if the call succeeded but was not cached
    pub fn into_value(self) -> Option<Value> {
        match self {
            CallError::Uncached { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Hit and miss counters for one cached function
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Results that were computed but not persisted
    pub persist_failures: u64,
}

/// Binds a [`CacheStore`] to the functions it memoizes
///
/// The store is loaded lazily on the first call. Two `CacheFunction`s on the
/// same path in one process keep independent tables; whichever writes last
/// wins the backing file.
///
/// ```no_run
/// use cachefn::{args, Args, CacheFunction, Value};
/// use std::convert::Infallible;
///
/// let mut add = CacheFunction::new("add.bin").decorator(|args: &Args| {
///     let a = args.get(0).and_then(Value::as_i64).unwrap_or(0);
///     let b = args.get(1).and_then(Value::as_i64).unwrap_or(0);
///     Ok::<_, Infallible>(Value::Int(a + b))
/// });
///
/// assert_eq!(add.call(&args![1, 2]).unwrap(), Value::Int(3));
/// ```
#[derive(Debug)]
pub struct CacheFunction {
    store: CacheStore,
    strict_persistence: bool,
}

impl CacheFunction {
    /// Creates a cache backed by `path` with default options
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, CacheOptions::default())
    }

    /// Creates a cache backed by `path` using `options`
    pub fn with_options(path: impl Into<PathBuf>, options: CacheOptions) -> Self {
        Self {
            store: CacheStore::from_options(path, &options),
            strict_persistence: options.strict_persistence,
        }
    }

    /// Wraps a pre-configured store
    pub fn with_store(store: CacheStore) -> Self {
        Self {
            store,
            strict_persistence: false,
        }
    }

    /// Returns persistence failures to the caller instead of logging them
    pub fn with_strict_persistence(mut self, strict: bool) -> Self {
        self.strict_persistence = strict;
        self
    }

    /// The backing store
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Mutable access to the backing store, e.g. to load or clear it
    pub fn store_mut(&mut self) -> &mut CacheStore {
        &mut self.store
    }

    /// Loads the table now instead of on the first call
    pub fn load(&mut self) -> Result<(), CacheError> {
        self.store.load()
    }

    /// Wraps `function` so its results are memoized in this cache
    pub fn decorator<F>(self, function: F) -> Cached<F> {
        Cached {
            cache: self,
            function,
            stats: CacheStats::default(),
        }
    }
}

/// A function wrapped by a [`CacheFunction`]
#[derive(Debug)]
pub struct Cached<F> {
    cache: CacheFunction,
    function: F,
    stats: CacheStats,
}

impl<F> Cached<F> {
    /// Calls the wrapped function, or returns the stored result for `args`
    ///
    /// # Behavior
    /// - Builds the key; an unhashable argument fails before the function runs
    /// - Loads the store on the first call
    /// - On a hit, returns the stored value without calling the function
    /// - On a miss, calls the function once and stores a successful result
    /// - A function error is returned as `CallError::Function` and is not cached
    /// - If storing fails, the computed value is still returned unless
    ///   strict persistence is enabled
    pub fn call<E>(&mut self, args: &Args) -> Result<Value, CallError<E>>
    where
        F: FnMut(&Args) -> Result<Value, E>,
    {
        let key = KeyBuilder::build(args)?;
        let store = &mut self.cache.store;
        store.load()?;

        if store.contains(&key) {
            self.stats.hits += 1;
            debug!(key = %key, "cache hit");
            return Ok(store.get(&key)?.clone());
        }

        self.stats.misses += 1;
        debug!(key = %key, "cache miss");
        let value = (self.function)(args).map_err(CallError::Function)?;

        match store.put(key, value.clone()) {
            Ok(()) => Ok(value),
            Err(err) => {
                self.stats.persist_failures += 1;
                if self.cache.strict_persistence || !err.is_persistence() {
                    return Err(CallError::Uncached { value, source: err });
                }
                warn!(
                    path = %store.path().display(),
                    error = %err,
                    "result computed but not persisted"
                );
                Ok(value)
            }
        }
    }

    /// Counters since this function was wrapped
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn store(&self) -> &CacheStore {
        &self.cache.store
    }

    pub fn store_mut(&mut self) -> &mut CacheStore {
        &mut self.cache.store
    }

    /// Persists any unsaved entries
    pub fn save(&mut self) -> Result<(), CacheError> {
        self.cache.store.save()
    }

    /// Unwraps into the cache and the original function
    pub fn into_parts(self) -> (CacheFunction, F) {
        (self.cache, self.function)
    }
}

/// Returns a decorator that caches a function's results in the file at `path`
///
/// Shorthand for `CacheFunction::new(path).decorator(function)`.
///
/// ```no_run
/// use cachefn::{args, cachefunction, Args, Value};
/// use std::convert::Infallible;
///
/// fn shout(args: &Args) -> Result<Value, Infallible> {
///     let word = args.get(0).and_then(Value::as_str).unwrap_or_default();
///     Ok(Value::from(word.to_uppercase()))
/// }
///
/// let mut shout = cachefunction("shout.bin")(shout);
/// assert_eq!(shout.call(&args!["hi"]).unwrap(), Value::from("HI"));
/// ```
pub fn cachefunction<F>(path: impl Into<PathBuf>) -> impl FnOnce(F) -> Cached<F> {
    let cache = CacheFunction::new(path);
    move |function| cache.decorator(function)
}
