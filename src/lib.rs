//! A batched deferred-load coordinator.
//!
//! Application code describes pending data fetches as [`LoadFuture`]
//! values, injects them into a [`Queue`] (deduplicating on a
//! `(handler_class, batching_key, instance_key)` triple), and later calls
//! [`Queue::drain`] to resolve everything pending through each future
//! kind's [`Handler`] in one batched call per group. [`combinators::Multi`]
//! and [`combinators::Sequence`] compose futures — fan-in and sequential
//! chaining — without ever touching the queue themselves.
//!
//! ```
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//! use loadq::{Error, Handler, LoadFuture, Queue, Slot};
//!
//! struct LoadUser {
//!     id: u64,
//!     slot: Slot<Option<String>>,
//! }
//!
//! impl LoadFuture for LoadUser {
//!     type Output = Option<String>;
//!     fn batching_key(&self) -> String {
//!         "users".to_string()
//!     }
//!     fn instance_key(&self) -> String {
//!         self.id.to_string()
//!     }
//!     fn slot(&self) -> &Slot<Self::Output> {
//!         &self.slot
//!     }
//! }
//!
//! impl Handler for LoadUser {
//!     fn satisfy_multi(
//!         group: &BTreeMap<String, Arc<Self>>,
//!         _batching_key: &String,
//!     ) -> Result<(), Error> {
//!         for future in group.values() {
//!             let name = format!("user-{}", future.id);
//!             future.satisfy(Some(name))?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let queue = Queue::new();
//! let seed = Arc::new(LoadUser {
//!     id: 7,
//!     slot: Slot::new(),
//! });
//! let pending = queue.ensure_in_queue(seed).unwrap();
//! queue.drain().unwrap();
//! assert_eq!(pending.result().unwrap(), Some("user-7".to_string()));
//! ```

#![warn(missing_docs)]

mod error;
mod future;
mod handler;
mod keys;
mod profiler;
mod queue;
mod slot;

pub mod combinators;

pub use error::Error;
pub use future::{erase, Completable, ErasedCompletable, LoadFuture};
pub use handler::Handler;
pub use keys::{BatchingKey, HandlerClass, InstanceKey};
pub use profiler::{NoopProfiler, Profiler, TracingProfiler};
pub use queue::Queue;
pub use slot::{SharedSlot, Slot};
