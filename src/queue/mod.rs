//! Bounded, single-consumer async task queue.
//!
//! This module provides [`TaskQueue`], which serializes otherwise-concurrent
//! asynchronous operations: any number of producers submit work without
//! blocking, and a single lazily-spawned background loop drains the queue in
//! strict FIFO order, one item at a time.
//!
//! Each submission carries an input value, a start operation (an async
//! function from the input to a result), and — for the typed shape — a
//! completion operation that receives the result. The two call shapes:
//!
//! | Shape    | Method                         | Completion                       |
//! |----------|--------------------------------|----------------------------------|
//! | Typed    | [`TaskQueue::submit`]          | invoked with the start's output  |
//! | Detached | [`TaskQueue::submit_detached`] | none; the output is discarded    |
//!
//! ## Guarantees
//!
//! - Admitted items are processed exactly once, in admission order; two items
//!   from the same queue never execute concurrently.
//! - At most one drain loop is active per queue at any instant. Whichever
//!   submission observes an idle queue spawns the loop; it exits when the
//!   queue is empty and is respawned by a later submission.
//! - The internal lock is held only for O(1) bookkeeping, never while an
//!   item's start operation is awaited, so a slow item never blocks
//!   producers.
//! - When a capacity bound is configured, submissions beyond the bound are
//!   silently dropped (see [`TaskQueue::submit`]); the pending count never
//!   exceeds the bound.
//! - A panicking item is isolated at its own task boundary and reported via
//!   the configured error observer (or a `tracing` error event); the drain
//!   loop always continues with the next item.

use std::collections::VecDeque;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{debug, error, trace};

mod item;
pub mod stats;

use item::Item;
pub use stats::QueueStats;

/// Errors returned by [`TaskQueue::submit`] and [`TaskQueue::submit_detached`].
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The queue has been disposed and accepts no further work.
    #[error("queue has been disposed — submission rejected")]
    QueueDisposed,
}

/// A failed queue item, as observed by the drain loop.
///
/// Every item executes inside its own Tokio task, so a panic in a start or
/// completion operation is caught at that task boundary rather than tearing
/// down the drain loop. The resulting [`JoinError`] is wrapped here and
/// handed to the queue's error observer, or logged at `error` level when no
/// observer is installed.
#[derive(Debug, Error)]
#[error("queued item {seq} failed: {source}")]
pub struct ItemFailure {
    seq: u64,
    #[source]
    source: JoinError,
}

impl ItemFailure {
    /// Admission-order sequence number of the failed item.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Returns `true` if the item failed because it panicked.
    pub fn is_panic(&self) -> bool {
        self.source.is_panic()
    }
}

/// Type-erased, reference-counted error observer.
///
/// Stored behind an [`Arc`] so the drain loop can invoke it from its
/// background task without copying the underlying closure. Construct one
/// implicitly through [`TaskQueueBuilder::on_error`].
pub type ErrorObserver = Arc<dyn Fn(ItemFailure) + Send + Sync + 'static>;

// Mutable queue state. Guarded by the admission lock; every access is O(1)
// and the lock is never held across an await.
struct Inner {
    pending: VecDeque<Item>,
    draining: bool,
    disposed: bool,
    next_seq: u64,
    submitted: u64,
    processed: u64,
    failed: u64,
    dropped: u64,
}

// State shared by all clones of a queue handle. `capacity` and `on_error`
// are fixed at construction; only `inner` mutates.
struct Shared {
    inner: Mutex<Inner>,
    capacity: Option<NonZeroUsize>,
    on_error: Option<ErrorObserver>,
}

/// A bounded, single-consumer asynchronous task queue.
///
/// `TaskQueue` is a cheaply-cloneable handle; clones share the same pending
/// sequence, so it can be handed to any number of producer tasks. Submission
/// is synchronous and never waits on in-flight work. Processing happens on a
/// background Tokio task that the queue starts and stops on its own.
///
/// # Examples
///
/// ```rust
/// use serialq::TaskQueue;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let queue = TaskQueue::new();
/// let (tx, rx) = tokio::sync::oneshot::channel();
///
/// queue
///     .submit(
///         2,
///         |n| async move { n + 2 },
///         move |sum| {
///             let _ = tx.send(sum);
///         },
///     )
///     .unwrap();
///
/// assert_eq!(rx.await.unwrap(), 4);
/// # }
/// ```
#[derive(Clone)]
pub struct TaskQueue {
    shared: Arc<Shared>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    /// Creates an unbounded queue with no error observer.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serialq::TaskQueue;
    ///
    /// let queue = TaskQueue::new();
    /// assert_eq!(queue.pending_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a queue that holds at most `max` pending items.
    ///
    /// A `max` of `0` means unbounded. Submissions arriving while the
    /// pending count is at the bound are silently dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serialq::TaskQueue;
    ///
    /// let queue = TaskQueue::with_capacity(128);
    /// assert_eq!(queue.stats().capacity, Some(128));
    /// ```
    pub fn with_capacity(max: usize) -> Self {
        Self::builder().capacity(max).build()
    }

    /// Returns a [`TaskQueueBuilder`] for configuring capacity and the error
    /// observer.
    pub fn builder() -> TaskQueueBuilder {
        TaskQueueBuilder::default()
    }

    /// Submits a typed unit of work: `on_start` receives `input` when the
    /// item is dequeued, and `on_complete` receives the start operation's
    /// output once it resolves.
    ///
    /// Admission is synchronous — this method appends to the pending
    /// sequence under a short-lived lock and returns immediately, without
    /// waiting for the item (or any earlier item) to execute. If no drain
    /// loop is active, one is spawned before returning.
    ///
    /// When the queue is at capacity the submission is **silently dropped**:
    /// no error is returned, the drop is counted in [`QueueStats::dropped`],
    /// and a `debug` event is emitted. Callers that need back-pressure
    /// feedback should poll [`pending_count`](Self::pending_count) or
    /// [`stats`](Self::stats).
    ///
    /// # Arguments
    ///
    /// - `input` — the value handed to `on_start`; owned by the item until
    ///   it runs.
    /// - `on_start` — async start operation, executed when the item reaches
    ///   the head of the queue.
    /// - `on_complete` — completion operation, invoked with the start
    ///   operation's output. Runs after `on_start` resolves, inside the same
    ///   item task.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::QueueDisposed`] if [`dispose`](Self::dispose)
    /// has been called.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime while a drain loop needs to
    /// be spawned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serialq::TaskQueue;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let queue = TaskQueue::new();
    /// let (tx, rx) = tokio::sync::oneshot::channel();
    ///
    /// queue
    ///     .submit(
    ///         "world",
    ///         |name| async move { format!("hello, {name}") },
    ///         move |greeting| {
    ///             let _ = tx.send(greeting);
    ///         },
    ///     )
    ///     .unwrap();
    ///
    /// assert_eq!(rx.await.unwrap(), "hello, world");
    /// # }
    /// ```
    pub fn submit<I, O, S, F, C>(
        &self,
        input: I,
        on_start: S,
        on_complete: C,
    ) -> Result<(), SubmitError>
    where
        I: Send + 'static,
        O: Send + 'static,
        S: FnOnce(I) -> F + Send + 'static,
        F: Future<Output = O> + Send + 'static,
        C: FnOnce(O) + Send + 'static,
    {
        self.admit(move |seq| Item::new(seq, input, on_start, on_complete))
    }

    /// Submits a detached (void-shape) unit of work: no completion operation
    /// is installed, and the start operation's output is discarded.
    ///
    /// Admission, capacity, and ordering semantics are identical to
    /// [`submit`](Self::submit) — both shapes share one pending sequence and
    /// one drain loop.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::QueueDisposed`] if [`dispose`](Self::dispose)
    /// has been called.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serialq::TaskQueue;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let queue = TaskQueue::new();
    /// let (tx, rx) = tokio::sync::oneshot::channel();
    ///
    /// queue
    ///     .submit_detached("ping", move |msg| async move {
    ///         let _ = tx.send(msg);
    ///     })
    ///     .unwrap();
    ///
    /// assert_eq!(rx.await.unwrap(), "ping");
    /// # }
    /// ```
    pub fn submit_detached<I, O, S, F>(&self, input: I, on_start: S) -> Result<(), SubmitError>
    where
        I: Send + 'static,
        O: Send + 'static,
        S: FnOnce(I) -> F + Send + 'static,
        F: Future<Output = O> + Send + 'static,
    {
        self.admit(move |seq| Item::detached(seq, input, on_start))
    }

    // The single admission path for both call shapes. Item construction is
    // deferred until after the capacity check so rejected submissions never
    // allocate an erased closure.
    fn admit(&self, make: impl FnOnce(u64) -> Item) -> Result<(), SubmitError> {
        let mut inner = self.shared.inner.lock();

        if inner.disposed {
            return Err(SubmitError::QueueDisposed);
        }

        if let Some(max) = self.shared.capacity {
            if inner.pending.len() >= max.get() {
                inner.dropped += 1;
                debug!(
                    pending = inner.pending.len(),
                    capacity = max.get(),
                    "queue at capacity — submission dropped"
                );
                return Ok(());
            }
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.pending.push_back(make(seq));
        inner.submitted += 1;
        trace!(seq, pending = inner.pending.len(), "item admitted");

        // False-to-true transition of the draining flag is the only spawn
        // site, so exactly one loop exists per queue at any instant.
        if !inner.draining {
            inner.draining = true;
            let queue = self.clone();
            tokio::spawn(async move { queue.drain().await });
        }

        Ok(())
    }

    // The drain loop. Dequeues under the lock, releases it, then runs the
    // item; exits by clearing the draining flag once the queue is empty.
    async fn drain(self) {
        debug!("drain loop started");

        loop {
            let item = {
                let mut inner = self.shared.inner.lock();
                match inner.pending.pop_front() {
                    Some(item) => item,
                    None => {
                        inner.draining = false;
                        debug!("queue empty — drain loop exiting");
                        return;
                    }
                }
            };

            self.process(item).await;
        }
    }

    // Runs one item to completion. The item executes in its own task so a
    // panicking start or completion operation surfaces as a `JoinError`
    // here instead of tearing down the drain loop; awaiting the join handle
    // keeps items strictly serialized.
    async fn process(&self, item: Item) {
        let seq = item.seq();
        trace!(seq, "processing item");

        match tokio::spawn(item.into_future()).await {
            Ok(()) => {
                self.shared.inner.lock().processed += 1;
            }
            Err(source) => {
                self.shared.inner.lock().failed += 1;
                let failure = ItemFailure { seq, source };
                match &self.shared.on_error {
                    Some(observer) => observer(failure),
                    None => error!(%failure, "item failed and no error observer is installed"),
                }
            }
        }
    }

    /// Returns the number of items admitted but not yet dequeued.
    ///
    /// The item currently being processed, if any, is not counted.
    pub fn pending_count(&self) -> usize {
        self.shared.inner.lock().pending.len()
    }

    /// Returns `true` if [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.shared.inner.lock().disposed
    }

    /// Takes a consistent snapshot of the queue's state and counters.
    pub fn stats(&self) -> QueueStats {
        let inner = self.shared.inner.lock();
        QueueStats {
            pending: inner.pending.len(),
            capacity: self.shared.capacity.map(NonZeroUsize::get),
            draining: inner.draining,
            disposed: inner.disposed,
            submitted: inner.submitted,
            processed: inner.processed,
            failed: inner.failed,
            dropped: inner.dropped,
        }
    }

    /// Disposes the queue: discards every pending item without running its
    /// start or completion operation and rejects all further submissions.
    ///
    /// An item whose start operation is already executing is **not**
    /// interrupted, and its completion operation still fires when the start
    /// operation resolves. Disposal is idempotent; there is no implicit
    /// disposal on drop, so embedding code decides exactly when the queue
    /// shuts down.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serialq::{SubmitError, TaskQueue};
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// let queue = TaskQueue::new();
    /// queue.dispose();
    ///
    /// assert!(queue.is_disposed());
    /// let rejected = queue.submit_detached((), |()| async {});
    /// assert!(matches!(rejected, Err(SubmitError::QueueDisposed)));
    /// # }
    /// ```
    pub fn dispose(&self) {
        let mut inner = self.shared.inner.lock();
        let discarded = inner.pending.len();
        inner.pending.clear();
        inner.draining = false;
        inner.disposed = true;

        if discarded > 0 {
            debug!(discarded, "queue disposed with unprocessed items");
        }
    }
}

/// Builder for [`TaskQueue`], configuring the capacity bound and the error
/// observer.
///
/// # Examples
///
/// ```rust
/// use serialq::TaskQueue;
///
/// let queue = TaskQueue::builder()
///     .capacity(64)
///     .on_error(|failure| eprintln!("item failed: {failure}"))
///     .build();
///
/// assert_eq!(queue.stats().capacity, Some(64));
/// ```
#[derive(Default)]
pub struct TaskQueueBuilder {
    capacity: usize,
    on_error: Option<ErrorObserver>,
}

impl TaskQueueBuilder {
    /// Sets the maximum number of pending items. `0` means unbounded.
    #[must_use]
    pub fn capacity(mut self, max: usize) -> Self {
        self.capacity = max;
        self
    }

    /// Installs an observer invoked with every [`ItemFailure`] the drain
    /// loop encounters. Without one, failures are logged at `error` level.
    #[must_use]
    pub fn on_error(mut self, observer: impl Fn(ItemFailure) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(observer));
        self
    }

    /// Builds the queue. No background task is spawned until the first
    /// submission.
    pub fn build(self) -> TaskQueue {
        TaskQueue {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    pending: VecDeque::new(),
                    draining: false,
                    disposed: false,
                    next_seq: 0,
                    submitted: 0,
                    processed: 0,
                    failed: 0,
                    dropped: 0,
                }),
                capacity: NonZeroUsize::new(self.capacity),
                on_error: self.on_error,
            }),
        }
    }
}
