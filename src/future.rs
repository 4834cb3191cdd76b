//! The future lifecycle and satisfaction contract.

use std::any::Any;
use std::sync::Arc;

use crate::error::Error;
use crate::keys::{next_instance_token, BatchingKey, HandlerClass, InstanceKey};
use crate::slot::Slot;

/// One pending (or satisfied) load, backed by a write-once [`Slot`].
///
/// Implementors are ordinarily injected into a [`crate::Queue`] via
/// [`crate::Handler`] and never constructed bare; the trait methods here are
/// the contract the queue relies on.
pub trait LoadFuture: Send + Sync + 'static {
    /// The value this future eventually produces. Must be `Clone` because
    /// every registered callback receives its own owned copy.
    type Output: Clone + Send + 'static;

    /// Which handler resolves this future. Defaults to the future's own
    /// concrete Rust type.
    fn handler_class(&self) -> HandlerClass
    where
        Self: Sized,
    {
        HandlerClass::of::<Self>()
    }

    /// Which group within the handler class this future batches with.
    /// Defaults to a single shared group.
    fn batching_key(&self) -> BatchingKey {
        "all".to_string()
    }

    /// What, specifically, this future loads. Override with a semantic key;
    /// the default is a fresh unique token and will never coalesce with
    /// anything.
    fn instance_key(&self) -> InstanceKey {
        next_instance_token()
    }

    /// Access to the backing result slot. Implementors typically store one
    /// `Slot<Self::Output>` field and return a reference to it here.
    fn slot(&self) -> &Slot<Self::Output>;

    /// Write the result and fire every registered callback in order.
    /// Returns `Error::AlreadySatisfied` if already written.
    fn satisfy(&self, value: Self::Output) -> Result<(), Error>
    where
        Self: Sized,
    {
        self.slot().satisfy(value)
    }

    /// The stored result, or `Error::NotYetSatisfied` if still pending.
    fn result(&self) -> Result<Self::Output, Error>
    where
        Self: Sized,
    {
        self.slot().result().ok_or(Error::NotYetSatisfied)
    }

    /// Whether this future has already been satisfied.
    fn satisfied(&self) -> bool
    where
        Self: Sized,
    {
        self.slot().satisfied()
    }

    /// Register a completion callback; see [`Slot::add_on_satisfy_callback`]
    /// for the immediate-vs-queued semantics.
    fn add_on_satisfy_callback<F>(&self, cb: F)
    where
        Self: Sized,
        F: FnOnce(Self::Output) + Send + 'static,
    {
        self.slot().add_on_satisfy_callback(Box::new(cb))
    }
}

/// Object-safe view of a completable value, used to compose combinators
/// (`Multi`, `Sequence`) over arbitrary `LoadFuture` implementors without
/// requiring `LoadFuture` itself to be object-safe.
///
/// `LoadFuture`'s generic `add_on_satisfy_callback<impl FnOnce>` cannot be
/// part of a trait object; this trait exposes the same capability through a
/// boxed callback instead.
pub trait Completable<T: Clone + Send + 'static>: Send + Sync {
    /// Whether the underlying value has already completed.
    fn satisfied(&self) -> bool;
    /// A clone of the completed value, if any.
    fn result(&self) -> Option<T>;
    /// Register a boxed completion callback.
    fn on_complete(&self, cb: Box<dyn FnOnce(T) + Send>);
}

impl<F: LoadFuture> Completable<F::Output> for F {
    fn satisfied(&self) -> bool {
        LoadFuture::satisfied(self)
    }
    fn result(&self) -> Option<F::Output> {
        self.slot().result()
    }
    fn on_complete(&self, cb: Box<dyn FnOnce(F::Output) + Send>) {
        self.slot().add_on_satisfy_callback(cb)
    }
}

/// A fully type-erased [`Completable`], used by [`crate::combinators::Sequence`]
/// to chain steps whose input and output types differ from step to step.
pub trait ErasedCompletable: Send + Sync {
    /// Register a callback that receives the completed value boxed as `Any`.
    fn on_complete_erased(&self, cb: Box<dyn FnOnce(Box<dyn Any + Send>) + Send>);
}

struct Erased<T, C> {
    inner: Arc<C>,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T, C> ErasedCompletable for Erased<T, C>
where
    T: Clone + Send + 'static,
    C: Completable<T> + ?Sized,
{
    fn on_complete_erased(&self, cb: Box<dyn FnOnce(Box<dyn Any + Send>) + Send>) {
        self.inner
            .on_complete(Box::new(move |v: T| cb(Box::new(v))));
    }
}

/// Erase a concrete [`Completable`] into a `dyn ErasedCompletable`, for use
/// as a [`crate::combinators::Sequence`] seed or intermediate step result.
pub fn erase<T, C>(inner: Arc<C>) -> Arc<dyn ErasedCompletable>
where
    T: Clone + Send + 'static,
    C: Completable<T> + 'static,
{
    Arc::new(Erased::<T, C> {
        inner,
        _marker: std::marker::PhantomData,
    })
}

/// Crate-internal type erasure used by the queue to hold heterogeneous
/// pending futures in one index and to probe satisfaction without knowing
/// the concrete type.
pub(crate) trait ErasedFuture: Send + Sync {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn satisfied_erased(&self) -> bool;
}

impl<F: LoadFuture> ErasedFuture for F {
    fn as_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
    fn satisfied_erased(&self) -> bool {
        LoadFuture::satisfied(self)
    }
}
