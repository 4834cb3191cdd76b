//! The closed set of failure modes this crate can produce.

use thiserror::Error as ThisError;

/// Every fallible operation in this crate returns one of these variants.
///
/// `BadCallback` and `CombinatorMisuse` are kept for documentation parity
/// with the taxonomy this coordinator's design is modeled on, even though
/// Rust's type system makes both unreachable here: a non-callable callback
/// argument is a compile error, and combinator futures never implement the
/// trait that exposes handler-class operations in the first place.
#[derive(Debug, ThisError)]
pub enum Error {
    /// `satisfy` was called on a future that already has a result.
    #[error("future already satisfied")]
    AlreadySatisfied,

    /// `result()` was called on a future that is still pending.
    #[error("future not yet satisfied")]
    NotYetSatisfied,

    /// Reserved for parity with the source taxonomy; unreachable in this crate.
    #[error("callback is not callable")]
    BadCallback,

    /// A handler's `satisfy_multi` returned without satisfying every member
    /// of the group it was handed.
    #[error(
        "handler class `{handler_class}` batching key `{batching_key}` left {actual}/{expected} futures unsatisfied"
    )]
    BatchIncomplete {
        /// Name of the handler class whose batch was incomplete.
        handler_class: String,
        /// The batching key of the offending group.
        batching_key: String,
        /// Number of futures that should have been satisfied.
        expected: usize,
        /// Number of futures actually satisfied.
        actual: usize,
    },

    /// A full drain iteration satisfied zero futures while the queue was
    /// still non-empty.
    #[error("drain pass made no progress while futures remain pending")]
    Stalled,

    /// A `Sequence` ran out of progression functions before its chain of
    /// futures stopped producing `StepResult::More`.
    #[error("sequence ran out of progression functions")]
    SequenceUnderrun,

    /// Reserved for parity with the source taxonomy; unreachable in this
    /// crate, since combinator futures never implement `Handler`.
    #[error("combinator futures cannot be used as handler-class members")]
    CombinatorMisuse,
}
