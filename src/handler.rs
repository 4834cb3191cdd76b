//! The class-level hook that resolves a batch of futures in one shot.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Error;
use crate::future::LoadFuture;
use crate::keys::{BatchingKey, InstanceKey};

/// Implemented by any future kind that can be used as a `handler_class`.
///
/// `satisfy_multi` must call `.satisfy(value)` exactly once on every entry
/// of `group` before returning; an incomplete batch is reported back to the
/// caller as `Error::BatchIncomplete`, not detected here.
pub trait Handler: LoadFuture + Sized {
    /// Resolve every future sharing `batching_key` in one call.
    ///
    /// Use an absent/null value (`None`, `()`, or whatever `Output`'s
    /// natural empty value is) if a particular instance turned up nothing;
    /// never satisfy a future that isn't in `group`.
    fn satisfy_multi(
        group: &BTreeMap<InstanceKey, Arc<Self>>,
        batching_key: &BatchingKey,
    ) -> Result<(), Error>;
}
