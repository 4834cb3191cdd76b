//! Identity keys used to group and deduplicate pending futures.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// A string-comparable tag naming which handler resolves a future.
///
/// Defaults to the future's own concrete Rust type name, which is the
/// natural realization of "defaults to the future's own kind" in a
/// statically typed coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerClass(&'static str);

impl HandlerClass {
    /// The handler class derived from a concrete Rust type.
    pub fn of<T: 'static>() -> Self {
        HandlerClass(std::any::type_name::<T>())
    }

    /// The underlying name, stable for the lifetime of the program.
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for HandlerClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A string-comparable tag grouping futures that can be resolved together
/// in one call to a handler's `satisfy_multi`.
pub type BatchingKey = String;

/// A string-comparable tag identifying what a particular future loads.
pub type InstanceKey = String;

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(0);

/// A fresh, process-wide unique instance key, used as the default
/// `instance_key()` for futures that don't override it with something
/// semantic.
pub fn next_instance_token() -> InstanceKey {
    format!("#{}", NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
}
