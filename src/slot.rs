//! The write-once result slot shared by every future kind in this crate.
//!
//! Grounded in the `Promise`/`Complete` split of the teacher's `promise.rs`:
//! a single inner cell, guarded by one lock, that is written at most once
//! and notifies whoever is waiting on it.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Error;

enum SlotState<T> {
    Pending(Vec<Box<dyn FnOnce(T) + Send>>),
    Satisfied(T),
}

/// A write-once cell with an ordered list of completion callbacks.
///
/// `T` must be `Clone` because, unlike a single-consumer promise, every
/// registered callback needs its own owned copy of the result.
pub struct Slot<T> {
    inner: Mutex<SlotState<T>>,
    queue_hook: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl<T: Clone + Send + 'static> Slot<T> {
    /// A fresh, pending slot with no callbacks registered.
    pub fn new() -> Self {
        Slot {
            inner: Mutex::new(SlotState::Pending(Vec::new())),
            queue_hook: Mutex::new(None),
        }
    }

    /// Install the owning `Queue`'s own completion hook, fired once, the
    /// instant this slot is satisfied and before any registered callback.
    /// Crate-private: a `Queue` sets this on a future at injection time so
    /// `register_satisfaction` runs synchronously inside `satisfy`, not as a
    /// diff computed after a whole batch call returns.
    pub(crate) fn set_queue_hook(&self, hook: Box<dyn FnOnce() + Send>) {
        *self.queue_hook.lock() = Some(hook);
    }

    /// Whether this slot has already been written.
    pub fn satisfied(&self) -> bool {
        matches!(&*self.inner.lock(), SlotState::Satisfied(_))
    }

    /// A clone of the stored value, or `None` if still pending.
    pub fn result(&self) -> Option<T> {
        match &*self.inner.lock() {
            SlotState::Satisfied(v) => Some(v.clone()),
            SlotState::Pending(_) => None,
        }
    }

    /// Write the slot, notify the owning queue (if any), then fire every
    /// registered callback in registration order. Returns
    /// `Error::AlreadySatisfied` if already written.
    ///
    /// Callbacks (and the queue hook) run after the internal lock is
    /// released, so one that reaches back into this slot (or any other
    /// locked state) never deadlocks against this call.
    pub fn satisfy(&self, value: T) -> Result<(), Error> {
        let callbacks = {
            let mut state = self.inner.lock();
            match &*state {
                SlotState::Satisfied(_) => return Err(Error::AlreadySatisfied),
                SlotState::Pending(_) => {}
            }
            let old = std::mem::replace(&mut *state, SlotState::Satisfied(value.clone()));
            match old {
                SlotState::Pending(cbs) => cbs,
                SlotState::Satisfied(_) => unreachable!(),
            }
        };
        if let Some(hook) = self.queue_hook.lock().take() {
            hook();
        }
        for cb in callbacks {
            cb(value.clone());
        }
        Ok(())
    }

    /// Register a completion callback. If the slot is already satisfied the
    /// callback runs immediately, synchronously, before this call returns.
    /// Otherwise it is queued and run in registration order at satisfaction
    /// time.
    pub fn add_on_satisfy_callback(&self, cb: Box<dyn FnOnce(T) + Send>) {
        enum Disposition<T> {
            RunNow(T),
            Queued,
        }
        let disposition = {
            let mut state = self.inner.lock();
            match &mut *state {
                SlotState::Satisfied(v) => Disposition::RunNow(v.clone()),
                SlotState::Pending(cbs) => {
                    cbs.push(cb);
                    Disposition::Queued
                }
            }
        };
        if let Disposition::RunNow(v) = disposition {
            cb(v);
        }
    }
}

impl<T: Clone + Send + 'static> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A reference-counted slot, convenient for sharing between a future and the
/// callbacks registered on it.
pub type SharedSlot<T> = Arc<Slot<T>>;
