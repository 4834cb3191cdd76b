//! Fan-in over a collection of child futures.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::future::Completable;
use crate::slot::Slot;

/// Completes with `Vec<T>`, position-stable with the input order, once
/// every child future has completed. An empty input completes synchronously
/// with an empty vector.
pub struct Multi<T: Clone + Send + 'static> {
    slot: Slot<Vec<T>>,
}

impl<T: Clone + Send + 'static> Multi<T> {
    /// Build a `Multi` over `children`, wiring a completion callback onto
    /// each one.
    pub fn new(children: Vec<Arc<dyn Completable<T>>>) -> Arc<Self> {
        let multi = Arc::new(Multi { slot: Slot::new() });
        let n = children.len();
        if n == 0 {
            let _ = multi.slot.satisfy(Vec::new());
            return multi;
        }

        let results: Arc<Mutex<Vec<Option<T>>>> = Arc::new(Mutex::new(vec![None; n]));
        let remaining = Arc::new(AtomicUsize::new(n));

        for (index, child) in children.into_iter().enumerate() {
            let results = results.clone();
            let remaining = remaining.clone();
            let multi = multi.clone();
            child.on_complete(Box::new(move |value: T| {
                results.lock()[index] = Some(value);
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    let gathered = results
                        .lock()
                        .iter()
                        .map(|v| v.clone().expect("every slot filled by the time remaining hits zero"))
                        .collect();
                    let _ = multi.slot.satisfy(gathered);
                }
            }));
        }

        multi
    }
}

impl<T: Clone + Send + 'static> Completable<Vec<T>> for Multi<T> {
    fn satisfied(&self) -> bool {
        self.slot.satisfied()
    }
    fn result(&self) -> Option<Vec<T>> {
        self.slot.result()
    }
    fn on_complete(&self, cb: Box<dyn FnOnce(Vec<T>) + Send>) {
        self.slot.add_on_satisfy_callback(cb)
    }
}

/// Keyed fan-in: completes with a `BTreeMap<K, T>` preserving the input key
/// set, once every child future has completed.
pub struct MultiMap<K: Ord + Clone + Send + 'static, T: Clone + Send + 'static> {
    slot: Slot<BTreeMap<K, T>>,
}

impl<K: Ord + Clone + Send + 'static, T: Clone + Send + 'static> MultiMap<K, T> {
    /// Build a `MultiMap` over `children`, wiring a completion callback onto
    /// each one.
    pub fn new(children: BTreeMap<K, Arc<dyn Completable<T>>>) -> Arc<Self> {
        let multi = Arc::new(MultiMap { slot: Slot::new() });
        let n = children.len();
        if n == 0 {
            let _ = multi.slot.satisfy(BTreeMap::new());
            return multi;
        }

        let results: Arc<Mutex<BTreeMap<K, T>>> = Arc::new(Mutex::new(BTreeMap::new()));
        let remaining = Arc::new(AtomicUsize::new(n));

        for (key, child) in children {
            let results = results.clone();
            let remaining = remaining.clone();
            let multi = multi.clone();
            let key_for_cb = key.clone();
            child.on_complete(Box::new(move |value: T| {
                results.lock().insert(key_for_cb, value);
                if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
                    let gathered = results.lock().clone();
                    let _ = multi.slot.satisfy(gathered);
                }
            }));
        }

        multi
    }
}

impl<K: Ord + Clone + Send + 'static, T: Clone + Send + 'static> Completable<BTreeMap<K, T>>
    for MultiMap<K, T>
{
    fn satisfied(&self) -> bool {
        self.slot.satisfied()
    }
    fn result(&self) -> Option<BTreeMap<K, T>> {
        self.slot.result()
    }
    fn on_complete(&self, cb: Box<dyn FnOnce(BTreeMap<K, T>) + Send>) {
        self.slot.add_on_satisfy_callback(cb)
    }
}
