#![forbid(unsafe_code)]

//! Single-threaded scheduling substrate for page widgets.
//!
//! Widgets on a page coordinate through two primitives:
//!
//! - [`Deferred`] / [`Completion`]: a promise for "this asynchronous step has
//!   finished", resolved at most once. Continuations registered with
//!   [`Completion::then`] run immediately when the completion is already
//!   resolved.
//! - [`EventBus`]: an in-process publish/subscribe bus with hierarchical
//!   dot-separated topics. Publishing enqueues; an explicit [`EventBus::flush`]
//!   (driven by the host's scheduling tick) delivers queued events in FIFO
//!   order and resolves each publish's completion after its handlers ran.
//!
//! Everything here is single-threaded by design: there is no locking, and
//! "asynchronous" means "after the current synchronous section, on the next
//! flush". Suspension points are exactly the returned completions.

pub mod bus;
pub mod completion;

pub use bus::{EventBus, Subscription};
pub use completion::{Completion, Deferred};
