//! Sequential chaining: thread a value through a pipeline of steps, each of
//! which may produce either a final value or another future to wait on.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::future::{Completable, ErasedCompletable};
use crate::slot::Slot;

/// One step in a [`Sequence`]'s pipeline. Consumes the previous step's (or
/// the seed's) boxed output and produces either a final value or a further
/// future to wait on.
///
/// Progression functions are genuinely heterogeneous: one step might
/// consume an integer and produce a future of some record, while the next
/// merely passes that record through unchanged. Type-erasing both the input
/// and the output of each step (rather than forcing one Rust type across
/// the whole chain) is what keeps that pattern expressible.
pub type StepFn = Box<dyn FnOnce(Box<dyn Any + Send>) -> StepResult + Send>;

/// What a [`StepFn`] produces.
pub enum StepResult {
    /// The chain is done; this value (downcast to the sequence's declared
    /// output type) satisfies it.
    Value(Box<dyn Any + Send>),
    /// Wait for this future, then feed its result to the next step.
    More(Arc<dyn ErasedCompletable>),
}

/// Completes with `Out` once its seed future and every subsequent step in
/// its pipeline has run to completion.
pub struct Sequence<Out: Clone + Send + 'static> {
    slot: Slot<Out>,
    cursor: Mutex<VecDeque<StepFn>>,
}

impl<Out: Clone + Send + 'static> Sequence<Out> {
    /// Build a sequence starting from `seed`, threading its result through
    /// `steps` in order.
    pub fn new(seed: Arc<dyn ErasedCompletable>, steps: Vec<StepFn>) -> Arc<Self> {
        let sequence = Arc::new(Sequence {
            slot: Slot::new(),
            cursor: Mutex::new(steps.into_iter().collect()),
        });
        Self::wire(sequence.clone(), seed);
        sequence
    }

    fn wire(self_arc: Arc<Self>, future: Arc<dyn ErasedCompletable>) {
        future.on_complete_erased(Box::new(move |value: Box<dyn Any + Send>| {
            self_arc.advance(value);
        }));
    }

    fn advance(self: Arc<Self>, value: Box<dyn Any + Send>) {
        let next = self.cursor.lock().pop_front();
        match next {
            None => panic!("sequence ran out of progression functions"),
            Some(step) => match step(value) {
                StepResult::Value(v) => {
                    let out = *v
                        .downcast::<Out>()
                        .unwrap_or_else(|_| panic!("sequence step produced the wrong output type"));
                    let _ = self.slot.satisfy(out);
                }
                StepResult::More(next_future) => {
                    Self::wire(self.clone(), next_future);
                }
            },
        }
    }
}

impl<Out: Clone + Send + 'static> Completable<Out> for Sequence<Out> {
    fn satisfied(&self) -> bool {
        self.slot.satisfied()
    }
    fn result(&self) -> Option<Out> {
        self.slot.result()
    }
    fn on_complete(&self, cb: Box<dyn FnOnce(Out) + Send>) {
        self.slot.add_on_satisfy_callback(cb)
    }
}
