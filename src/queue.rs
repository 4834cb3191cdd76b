//! The batching coordinator: deduplicates pending futures on identity,
//! groups them, and drains them in handler-class preference order.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::Error;
use crate::future::{ErasedFuture, LoadFuture};
use crate::handler::Handler;
use crate::keys::{BatchingKey, HandlerClass, InstanceKey};
use crate::profiler::{NoopProfiler, Profiler};

type AnyFuture = Arc<dyn ErasedFuture>;
type Group = BTreeMap<InstanceKey, AnyFuture>;
type ClassIndex = BTreeMap<HandlerClass, BTreeMap<BatchingKey, Group>>;

/// Crate-private dispatcher that downcasts an erased group back to its
/// concrete future type and calls `Handler::satisfy_multi` on it.
///
/// One is registered per handler class the first time a future of that
/// class is injected, so the queue never needs to be generic over every
/// future type it has ever seen.
trait ErasedResolver: Send + Sync {
    fn satisfy_group(&self, group: &Group, batching_key: &BatchingKey) -> Result<(), Error>;
}

struct ResolverFor<F>(PhantomData<fn() -> F>);

impl<F: Handler> ErasedResolver for ResolverFor<F> {
    fn satisfy_group(&self, group: &Group, batching_key: &BatchingKey) -> Result<(), Error> {
        let typed: BTreeMap<InstanceKey, Arc<F>> = group
            .iter()
            .map(|(k, v)| {
                let any: Arc<dyn Any + Send + Sync> = v.clone().as_any_arc();
                let concrete = any.downcast::<F>().unwrap_or_else(|_| {
                    panic!("handler_class resolved to a future of the wrong concrete type")
                });
                (k.clone(), concrete)
            })
            .collect();
        F::satisfy_multi(&typed, batching_key)
    }
}

struct State {
    pending: ClassIndex,
    pending_size: usize,
    resolvers: BTreeMap<HandlerClass, Arc<dyn ErasedResolver>>,
    class_types: BTreeMap<HandlerClass, TypeId>,
    class_weights: BTreeMap<HandlerClass, u64>,
    satisfied_cache: Option<ClassIndex>,
    profiler: Arc<dyn Profiler>,
}

impl State {
    fn fresh() -> Self {
        State {
            pending: BTreeMap::new(),
            pending_size: 0,
            resolvers: BTreeMap::new(),
            class_types: BTreeMap::new(),
            class_weights: BTreeMap::new(),
            satisfied_cache: None,
            profiler: Arc::new(NoopProfiler),
        }
    }
}

/// The queue coordinator.
///
/// Owns the pending set, deduplicates injections on the
/// `(handler_class, batching_key, instance_key)` triple, and runs drain
/// passes that satisfy every pending future through its handler class.
///
/// `Queue` is `Send + Sync`; its internal mutex is never held while calling
/// into user code (a handler's `satisfy_multi`, a future's callbacks, or the
/// profiler), so re-entrant injection from inside a callback is safe. Only
/// one `drain()` call is expected to be in flight at a time; concurrent
/// drains are not a supported scenario.
pub struct Queue {
    state: Mutex<State>,
    self_weak: Weak<Queue>,
}

impl Queue {
    /// A fresh, empty queue with the default no-op profiler.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|weak| Queue {
            state: Mutex::new(State::fresh()),
            self_weak: weak.clone(),
        })
    }

    /// Install a profiler wrapping every future batch invocation.
    pub fn set_profiler(&self, profiler: Arc<dyn Profiler>) {
        self.state.lock().profiler = profiler;
    }

    /// Bias drain order so every pending future of handler class `first` is
    /// resolved before any future of handler class `second` that was
    /// already pending at the start of the same iteration.
    ///
    /// Monotone: never lowers `second`'s effective weight relative to
    /// `first`'s.
    pub fn set_preferred_load_order(&self, first: HandlerClass, second: HandlerClass) {
        let mut st = self.state.lock();
        let w1 = *st.class_weights.entry(first).or_insert(0);
        let needed = w1 + 1;
        let w2 = st.class_weights.entry(second).or_insert(0);
        if *w2 <= w1 {
            *w2 = needed;
        }
    }

    /// Register `future` with the queue, or return the equivalent future
    /// already known under the same `(handler_class, batching_key,
    /// instance_key)` triple — pending, or satisfied earlier in the current
    /// drain pass.
    pub fn ensure_in_queue<F: Handler>(&self, future: Arc<F>) -> Result<Arc<F>, Error> {
        let h = future.handler_class();
        let b = future.batching_key();
        let i = future.instance_key();

        let mut st = self.state.lock();

        match st.class_types.get(&h) {
            Some(existing) if *existing != TypeId::of::<F>() => panic!(
                "handler class `{}` is used by two distinct concrete future types in this queue",
                h.name()
            ),
            Some(_) => {}
            None => {
                st.class_types.insert(h, TypeId::of::<F>());
            }
        }

        if let Some(existing) = Self::lookup(st.satisfied_cache.as_ref(), &h, &b, &i) {
            return Ok(downcast_future(existing));
        }
        if let Some(existing) = Self::lookup(Some(&st.pending), &h, &b, &i) {
            return Ok(downcast_future(existing));
        }

        st.resolvers
            .entry(h)
            .or_insert_with(|| Arc::new(ResolverFor::<F>(PhantomData)) as Arc<dyn ErasedResolver>);

        let erased: AnyFuture = future.clone();
        st.pending
            .entry(h)
            .or_default()
            .entry(b.clone())
            .or_default()
            .insert(i.clone(), erased);
        st.pending_size += 1;
        drop(st);

        // Registered before the future is handed back to the caller, so it
        // always fires ahead of any callback the caller attaches later —
        // satisfying spec §4.2.2's "notify the coordinator, then fire
        // registered callbacks" ordering regardless of when user code
        // attaches its own callbacks.
        let weak = self.self_weak.clone();
        future.slot().set_queue_hook(Box::new(move || {
            if let Some(queue) = weak.upgrade() {
                queue.register_satisfaction(h, b, i);
            }
        }));

        Ok(future)
    }

    /// Remove a single future from `pending` and, if a drain pass is active,
    /// move it into `satisfied_cache` — called synchronously from inside
    /// `LoadFuture::satisfy` the instant that specific future is written, not
    /// as a group-level diff computed after a batch call returns. A no-op if
    /// the triple is no longer pending (already removed, or never pending in
    /// the first place).
    fn register_satisfaction(&self, h: HandlerClass, b: BatchingKey, i: InstanceKey) {
        let mut st = self.state.lock();

        let mut removed = None;
        if let Some(by_batch) = st.pending.get_mut(&h) {
            if let Some(group) = by_batch.get_mut(&b) {
                removed = group.remove(&i);
                if group.is_empty() {
                    by_batch.remove(&b);
                }
            }
            if by_batch.is_empty() {
                st.pending.remove(&h);
            }
        }

        let future = match removed {
            Some(f) => f,
            None => return,
        };

        st.pending_size -= 1;
        if let Some(cache) = st.satisfied_cache.as_mut() {
            cache.entry(h).or_default().entry(b).or_default().insert(i, future);
        }
    }

    fn lookup<'a>(
        index: Option<&'a ClassIndex>,
        h: &HandlerClass,
        b: &BatchingKey,
        i: &InstanceKey,
    ) -> Option<&'a AnyFuture> {
        index?.get(h)?.get(b)?.get(i)
    }

    /// Whether any future is currently pending in this queue.
    pub fn is_empty(&self) -> bool {
        self.state.lock().pending_size == 0
    }

    /// Run drain passes until every pending future has been satisfied.
    ///
    /// Each iteration computes the handler-class visitation order fresh
    /// (ascending preference weight, ties broken by class name), then
    /// visits each class's batching keys — snapshotted once per class per
    /// iteration — handing each non-empty group to its handler.
    ///
    /// A future leaves `pending` (and enters `satisfied_cache`) the instant
    /// its own `satisfy` call runs, via the per-future hook `ensure_in_queue`
    /// installs at injection time — not as a diff computed once the whole
    /// batch call returns. That means a group snapshotted here never needs
    /// to be removed from `pending` up front: members the handler actually
    /// satisfies disappear on their own, and members it doesn't are simply
    /// still there afterward, with nothing to put back.
    ///
    /// A handler that satisfies only *some* of its given group yields
    /// `Error::BatchIncomplete` immediately. One that satisfies *none* of it
    /// but registers other, unrelated work instead is given the benefit of
    /// the doubt for this group and deferred to the iteration-wide progress
    /// check: if literally nothing was satisfied anywhere this iteration
    /// while the queue is still non-empty, that's `Error::Stalled`. A
    /// handler that satisfies none of its group and registers nothing else
    /// has no path to ever make progress, so it still fails fast as
    /// `BatchIncomplete`. Either error propagates immediately and abandons
    /// the pass, leaving whatever is still pending in the queue for a future
    /// `drain()` call.
    pub fn drain(&self) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }

        self.state.lock().satisfied_cache = Some(BTreeMap::new());
        let _guard = DrainGuard(self);

        loop {
            let classes = {
                let st = self.state.lock();
                if st.pending_size == 0 {
                    break;
                }
                let mut v: Vec<HandlerClass> = st.pending.keys().copied().collect();
                v.sort_by_key(|h| (*st.class_weights.get(h).unwrap_or(&0), h.name()));
                v
            };

            let mut iteration_progress: u64 = 0;

            for h in classes {
                let keys: Vec<BatchingKey> = {
                    let st = self.state.lock();
                    st.pending
                        .get(&h)
                        .map(|m| m.keys().cloned().collect())
                        .unwrap_or_default()
                };

                for b in keys {
                    let group = {
                        let st = self.state.lock();
                        st.pending.get(&h).and_then(|m| m.get(&b)).cloned()
                    };
                    let group = match group {
                        Some(g) if !g.is_empty() => g,
                        _ => continue,
                    };
                    let expected = group.len();

                    let (resolver, profiler) = {
                        let st = self.state.lock();
                        let resolver = st
                            .resolvers
                            .get(&h)
                            .cloned()
                            .expect("resolver registered at injection time");
                        (resolver, st.profiler.clone())
                    };

                    let pending_before = self.state.lock().pending_size;
                    let mut call = || resolver.satisfy_group(&group, &b);
                    profiler.profile(&h, &b, expected, &mut call)?;
                    let pending_after = self.state.lock().pending_size;

                    let actual = group.values().filter(|f| f.satisfied_erased()).count();

                    if actual < expected {
                        let registered_other_work = pending_after > pending_before.saturating_sub(actual);
                        if actual == 0 && registered_other_work {
                            continue;
                        }
                        return Err(Error::BatchIncomplete {
                            handler_class: h.name().to_string(),
                            batching_key: b,
                            expected,
                            actual,
                        });
                    }

                    iteration_progress += actual as u64;
                }
            }

            if iteration_progress == 0 {
                let still_pending = self.state.lock().pending_size;
                if still_pending > 0 {
                    return Err(Error::Stalled);
                }
            }
        }

        Ok(())
    }

    /// Run `f` against a fresh, empty queue state (pending set, pending
    /// count, preference weights, handler-class bindings, and any
    /// in-progress drain-pass cache) scoped to `f`'s execution, then restore
    /// the original state afterward — whether `f` returns normally or
    /// panics. Anything left pending in the scoped queue when `f` returns is
    /// discarded.
    ///
    /// Also saves and restores `satisfied_cache` rather than just
    /// discarding it: calling this from inside a handler's `satisfy_multi`
    /// (running a nested `drain()` mid-batch) must not clobber the enclosing
    /// drain pass's own cache once the scope exits.
    pub fn with_scoped_queue<R>(&self, f: impl FnOnce() -> R) -> R {
        let saved = {
            let mut st = self.state.lock();
            State {
                pending: std::mem::take(&mut st.pending),
                pending_size: std::mem::replace(&mut st.pending_size, 0),
                resolvers: std::mem::take(&mut st.resolvers),
                class_types: std::mem::take(&mut st.class_types),
                class_weights: std::mem::take(&mut st.class_weights),
                satisfied_cache: std::mem::take(&mut st.satisfied_cache),
                profiler: st.profiler.clone(),
            }
        };
        let _restore = ScopeRestore {
            queue: self,
            saved: Some(saved),
        };
        f()
    }
}

fn downcast_future<F: 'static>(erased: &AnyFuture) -> Arc<F> {
    erased.clone().as_any_arc().downcast::<F>().unwrap_or_else(|_| {
        panic!("handler_class resolved to a future of the wrong concrete type")
    })
}

struct DrainGuard<'a>(&'a Queue);

impl<'a> Drop for DrainGuard<'a> {
    fn drop(&mut self) {
        self.0.state.lock().satisfied_cache = None;
    }
}

struct ScopeRestore<'a> {
    queue: &'a Queue,
    saved: Option<State>,
}

impl<'a> Drop for ScopeRestore<'a> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            *self.queue.state.lock() = saved;
        }
    }
}
