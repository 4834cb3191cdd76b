//! Instrumentation hook wrapped around every batch invocation.

use crate::error::Error;
use crate::keys::{BatchingKey, HandlerClass};

/// Wraps each call to a handler's `satisfy_multi`.
///
/// The default, installed on every new [`crate::Queue`], is a transparent
/// pass-through. Install [`TracingProfiler`] (or your own) via
/// [`crate::Queue::set_profiler`] to observe batch sizes and timings.
pub trait Profiler: Send + Sync {
    /// Run `thunk`, optionally wrapping it with instrumentation.
    /// Implementations must call `thunk()` exactly once and propagate its
    /// result unchanged.
    fn profile(
        &self,
        handler_class: &HandlerClass,
        batching_key: &BatchingKey,
        count: usize,
        thunk: &mut dyn FnMut() -> Result<(), Error>,
    ) -> Result<(), Error>;
}

/// The do-nothing profiler: calls `thunk` and returns its result unchanged.
#[derive(Debug, Default)]
pub struct NoopProfiler;

impl Profiler for NoopProfiler {
    fn profile(
        &self,
        _handler_class: &HandlerClass,
        _batching_key: &BatchingKey,
        _count: usize,
        thunk: &mut dyn FnMut() -> Result<(), Error>,
    ) -> Result<(), Error> {
        thunk()
    }
}

/// Wraps each batch in a `tracing` span and logs its elapsed time.
#[derive(Debug, Default)]
pub struct TracingProfiler;

impl Profiler for TracingProfiler {
    fn profile(
        &self,
        handler_class: &HandlerClass,
        batching_key: &BatchingKey,
        count: usize,
        thunk: &mut dyn FnMut() -> Result<(), Error>,
    ) -> Result<(), Error> {
        let span = tracing::info_span!(
            "loadq.batch",
            handler_class = %handler_class,
            batching_key = %batching_key,
            count
        );
        let _enter = span.enter();
        let start = std::time::Instant::now();
        let result = thunk();
        tracing::debug!(
            elapsed_us = start.elapsed().as_micros() as u64,
            ok = result.is_ok(),
            "batch resolved"
        );
        result
    }
}
