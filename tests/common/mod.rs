//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use cachefn::{Args, Value};

/// A deliberately slow, deterministic function that counts its invocations
///
/// The result is derived from every argument, so any two calls that should
/// share a cache entry return equal values.
pub struct SlowFunction {
    pub calls: Rc<Cell<u32>>,
    pub delay: Duration,
}

impl SlowFunction {
    pub fn new(delay: Duration) -> Self {
        Self {
            calls: Rc::new(Cell::new(0)),
            delay,
        }
    }

    /// Returns the callable and keeps the counter for assertions
    pub fn into_fn(self) -> (impl FnMut(&Args) -> Result<Value, Infallible>, Rc<Cell<u32>>) {
        let counter = Rc::clone(&self.calls);
        let delay = self.delay;
        let function = move |args: &Args| {
            counter.set(counter.get() + 1);
            thread::sleep(delay);
            Ok(describe(args))
        };
        (function, self.calls)
    }
}

/// Canonical description of a call: positional values, then keywords by name
pub fn describe(args: &Args) -> Value {
    let mut keyword: Vec<(String, Value)> = args.keyword().to_vec();
    keyword.sort_by(|a, b| a.0.cmp(&b.0));
    let keyword = keyword
        .into_iter()
        .map(|(name, value)| Value::Tuple(vec![Value::Str(name), value]))
        .collect();
    Value::Tuple(vec![
        Value::Tuple(args.positional().to_vec()),
        Value::Tuple(keyword),
    ])
}

/// Adds the first two positional integers
pub fn add(args: &Args) -> Result<Value, Infallible> {
    let a = args.get(0).and_then(Value::as_i64).unwrap_or(0);
    let b = args.get(1).and_then(Value::as_i64).unwrap_or(0);
    Ok(Value::Int(a + b))
}
