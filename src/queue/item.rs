//! Type-erased queue item representation.
//!
//! An [`Item`] binds an input value, a start operation, and an optional
//! completion operation together with full type information at construction
//! time, then erases the types behind one boxed closure. The drain loop only
//! ever sees `FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>>`, so the
//! two public call shapes (typed result vs. detached) share a single pending
//! sequence and a single processing path.

use std::pin::Pin;

// Deferred execution: the closure is only invoked once the drain loop
// dequeues the item, so the start operation must not run at admission time.
type ErasedRun = Box<dyn FnOnce() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send>;

/// One unit of submitted work, immutable once constructed.
///
/// Items are created at submission, processed exactly once by the drain
/// loop, and never re-enter the queue.
pub(crate) struct Item {
    seq: u64,
    run: ErasedRun,
}

impl Item {
    /// Builds a typed-result item: the start operation's output is handed to
    /// the completion operation once the start future resolves.
    ///
    /// Input and output types are bound here, at construction — completion
    /// dispatch never inspects or re-checks the produced value's type.
    pub(crate) fn new<I, O, S, F, C>(seq: u64, input: I, on_start: S, on_complete: C) -> Self
    where
        I: Send + 'static,
        O: Send + 'static,
        S: FnOnce(I) -> F + Send + 'static,
        F: Future<Output = O> + Send + 'static,
        C: FnOnce(O) + Send + 'static,
    {
        let run: ErasedRun = Box::new(move || {
            Box::pin(async move {
                let output = on_start(input).await;
                on_complete(output);
            })
        });
        Self { seq, run }
    }

    /// Builds a detached (void-shape) item: no completion operation is
    /// installed and the start operation's output is discarded.
    pub(crate) fn detached<I, O, S, F>(seq: u64, input: I, on_start: S) -> Self
    where
        I: Send + 'static,
        O: Send + 'static,
        S: FnOnce(I) -> F + Send + 'static,
        F: Future<Output = O> + Send + 'static,
    {
        let run: ErasedRun = Box::new(move || {
            Box::pin(async move {
                let _ = on_start(input).await;
            })
        });
        Self { seq, run }
    }

    /// Admission-order sequence number, assigned by the queue.
    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    /// Consumes the item and produces the future that runs its start
    /// operation and then dispatches its completion operation.
    pub(crate) fn into_future(self) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        (self.run)()
    }
}
