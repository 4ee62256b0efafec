//! Cache engine
//!
//! A [`CacheStore`] keeps a [`CacheTable`] in memory and mirrors it to one
//! backing file. A [`CacheFunction`] binds a store to a wrapped function so
//! that calls are answered from the table when possible and computed (then
//! persisted) otherwise.

mod function;
mod store;
mod table;

pub use function::{cachefunction, CacheFunction, CacheStats, Cached, CallError};
pub use store::CacheStore;
pub use table::CacheTable;
