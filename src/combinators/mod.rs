//! Combinator futures. `Multi` and `Sequence` never enter a [`crate::Queue`]:
//! they are wired entirely through completion callbacks over whatever
//! futures (or other combinators) they're built from, and carry no
//! `handler_class`, `batching_key`, or `instance_key` at all. Accessing
//! those concepts on a combinator is therefore a compile error rather than
//! a runtime one.

mod multi;
mod sequence;

pub use multi::{Multi, MultiMap};
pub use sequence::{Sequence, StepFn, StepResult};
