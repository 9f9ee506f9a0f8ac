//! Point-in-time queue statistics.

use serde::Serialize;

/// A consistent snapshot of a queue's state and lifetime counters.
///
/// Taken atomically under the admission lock by [`TaskQueue::stats`], so the
/// fields always agree with each other. Serializable so callers can embed
/// snapshots in their own health or status endpoints.
///
/// Counters are monotonic over the queue's lifetime; `pending` is the only
/// field that can decrease.
///
/// [`TaskQueue::stats`]: crate::TaskQueue::stats
///
/// # Examples
///
/// ```rust
/// use serialq::TaskQueue;
///
/// let queue = TaskQueue::with_capacity(8);
/// let stats = queue.stats();
/// assert_eq!(stats.capacity, Some(8));
/// assert_eq!(stats.pending, 0);
/// assert!(!stats.disposed);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Items admitted but not yet dequeued by the drain loop.
    pub pending: usize,
    /// Configured capacity bound; `None` when unbounded.
    pub capacity: Option<usize>,
    /// Whether a drain loop is currently active.
    pub draining: bool,
    /// Whether the queue has been disposed.
    pub disposed: bool,
    /// Total submissions admitted to the pending sequence.
    pub submitted: u64,
    /// Items that ran to completion, including their completion dispatch.
    pub processed: u64,
    /// Items whose start or completion operation failed.
    pub failed: u64,
    /// Submissions silently dropped because the queue was at capacity.
    pub dropped: u64,
}
