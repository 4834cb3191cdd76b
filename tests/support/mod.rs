//! Shared illustrative future/handler fixtures used across the integration
//! tests. Stand-ins for real backend loaders, which this crate deliberately
//! does not ship.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use loadq::{Error, Handler, LoadFuture, Queue, Slot};

/// Loads a user's display name by id. Batches all pending ids into one
/// `satisfy_multi` call per drain iteration and records how many times it
/// was actually invoked, so tests can assert on batching behavior.
pub struct LoadUser {
    pub id: u64,
    pub slot: Slot<Option<String>>,
}

impl LoadUser {
    pub fn new(id: u64) -> Arc<Self> {
        Arc::new(LoadUser {
            id,
            slot: Slot::new(),
        })
    }
}

impl LoadFuture for LoadUser {
    type Output = Option<String>;

    fn batching_key(&self) -> String {
        "users".to_string()
    }
    fn instance_key(&self) -> String {
        self.id.to_string()
    }
    fn slot(&self) -> &Slot<Self::Output> {
        &self.slot
    }
}

pub static USER_BATCH_CALLS: AtomicUsize = AtomicUsize::new(0);

impl Handler for LoadUser {
    fn satisfy_multi(
        group: &BTreeMap<String, Arc<Self>>,
        _batching_key: &String,
    ) -> Result<(), Error> {
        USER_BATCH_CALLS.fetch_add(1, Ordering::SeqCst);
        for future in group.values() {
            future.satisfy(Some(format!("user-{}", future.id)))?;
        }
        Ok(())
    }
}

/// Looks up a user's id by name, and injects a follow-up `LoadUser` once
/// resolved — used to exercise cross-class load-order preference.
pub struct GetUserIdByName {
    pub name: String,
    pub slot: Slot<u64>,
}

impl GetUserIdByName {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(GetUserIdByName {
            name: name.to_string(),
            slot: Slot::new(),
        })
    }
}

impl LoadFuture for GetUserIdByName {
    type Output = u64;

    fn batching_key(&self) -> String {
        "names".to_string()
    }
    fn instance_key(&self) -> String {
        self.name.clone()
    }
    fn slot(&self) -> &Slot<Self::Output> {
        &self.slot
    }
}

pub static NAME_BATCH_CALLS: AtomicUsize = AtomicUsize::new(0);

impl Handler for GetUserIdByName {
    fn satisfy_multi(
        group: &BTreeMap<String, Arc<Self>>,
        _batching_key: &String,
    ) -> Result<(), Error> {
        NAME_BATCH_CALLS.fetch_add(1, Ordering::SeqCst);
        for (index, future) in group.values().enumerate() {
            future.satisfy(100 + index as u64)?;
        }
        Ok(())
    }
}

/// A handler that deliberately leaves some of its group unsatisfied, to
/// exercise `Error::BatchIncomplete`.
pub struct Flaky {
    pub key: String,
    pub slot: Slot<u64>,
}

impl Flaky {
    pub fn new(key: &str) -> Arc<Self> {
        Arc::new(Flaky {
            key: key.to_string(),
            slot: Slot::new(),
        })
    }
}

impl LoadFuture for Flaky {
    type Output = u64;

    fn instance_key(&self) -> String {
        self.key.clone()
    }
    fn slot(&self) -> &Slot<Self::Output> {
        &self.slot
    }
}

impl Handler for Flaky {
    fn satisfy_multi(
        group: &BTreeMap<String, Arc<Self>>,
        _batching_key: &String,
    ) -> Result<(), Error> {
        // Intentionally satisfy none of them.
        let _ = group;
        Ok(())
    }
}

/// A handler that, instead of satisfying its own group, always registers a
/// fresh instance of itself under a new instance key and leaves the group it
/// was given untouched — used to exercise `Error::Stalled`: it makes no
/// progress on what it's handed, but it isn't simply unresponsive either, so
/// it shouldn't be reported as `BatchIncomplete`.
pub struct Staller {
    pub queue: Arc<Queue>,
    pub seed: u64,
    pub slot: Slot<u64>,
}

impl Staller {
    pub fn new(queue: Arc<Queue>, seed: u64) -> Arc<Self> {
        Arc::new(Staller {
            queue,
            seed,
            slot: Slot::new(),
        })
    }
}

impl LoadFuture for Staller {
    type Output = u64;

    fn instance_key(&self) -> String {
        self.seed.to_string()
    }
    fn slot(&self) -> &Slot<Self::Output> {
        &self.slot
    }
}

impl Handler for Staller {
    fn satisfy_multi(
        group: &BTreeMap<String, Arc<Self>>,
        _batching_key: &String,
    ) -> Result<(), Error> {
        for future in group.values() {
            future
                .queue
                .ensure_in_queue(Staller::new(future.queue.clone(), future.seed + 1))?;
        }
        Ok(())
    }
}
