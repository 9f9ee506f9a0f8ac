//! # serialq
//!
//! A bounded, single-consumer asynchronous task queue for Tokio.
//!
//! Producers submit units of work — an input value plus an async "start"
//! operation, optionally paired with a "completion" callback — and a single
//! lazily-spawned background loop drains them in strict FIFO order, one at a
//! time. Submission is synchronous and never waits on in-flight work, so the
//! queue decouples *when work is requested* from *when it runs*.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serialq::TaskQueue;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Hold at most 32 pending items; excess submissions are dropped.
//!     let queue = TaskQueue::with_capacity(32);
//!
//!     queue.submit(
//!         "https://example.com",
//!         |url| async move { format!("fetched {url}") },
//!         |page| println!("{page}"),
//!     ).unwrap();
//! }
//! ```

// ── Core module ───────────────────────────────────────────────────────────────
pub mod queue;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use queue::{ErrorObserver, ItemFailure, QueueStats, SubmitError, TaskQueue, TaskQueueBuilder};
