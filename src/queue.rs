//! Work queue between the sequence reader and the counting workers.
//!
//! ```text
//! ┌─────────────────┐  push   ┌─────────────────┐  pop   ┌─────────────────┐
//! │ SequenceSource  │────────>│    WorkQueue    │───────>│  worker 0..N    │
//! │ (orchestrator)  │  close  │    (channel)    │  STOP  │  (CounterPool)  │
//! └─────────────────┘────────>└─────────────────┘───────>└─────────────────┘
//! ```
//!
//! The queue is either open or closed, and either empty or not. A consumer's
//! [`pop`](QueueConsumer::pop) blocks while the queue is open and empty, returns
//! an item while one is queued, and returns `None` (STOP) only once the queue is
//! closed *and* drained. Closing is the orchestrator's promise that no further
//! item will be pushed; it wakes every blocked consumer.
//!
//! The queue owns the only sender of the underlying channel. Closing drops that
//! sender, so dropping the queue on any exit path also closes it and no worker
//! can be left waiting forever.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::error::PushError;

/// A FIFO of pending work with an explicit, irreversible close signal.
///
/// # Example
///
/// ```rust
/// use kmertally::queue::WorkQueue;
///
/// let mut queue = WorkQueue::unbounded();
/// let consumer = queue.consumer();
///
/// queue.push("ACGT").unwrap();
/// queue.push("GGCC").unwrap();
/// queue.close();
///
/// // Items queued before close are still delivered, then STOP.
/// assert_eq!(consumer.pop(), Some("ACGT"));
/// assert_eq!(consumer.pop(), Some("GGCC"));
/// assert_eq!(consumer.pop(), None);
/// ```
#[derive(Debug)]
pub struct WorkQueue<T> {
    sender: Option<Sender<T>>,
    receiver: Receiver<T>,
}

impl<T> WorkQueue<T> {
    /// Creates an open queue with no capacity limit.
    #[must_use]
    pub fn unbounded() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender: Some(sender),
            receiver,
        }
    }

    /// Creates an open queue holding at most `capacity` items; `push` blocks
    /// while it is full. A capacity of zero is raised to one.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender: Some(sender),
            receiver,
        }
    }

    /// Creates a bounded queue for `Some(capacity)`, unbounded for `None`.
    #[must_use]
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        capacity.map_or_else(Self::unbounded, Self::bounded)
    }

    /// Appends `item` to the tail and wakes a waiting consumer.
    ///
    /// On a bounded queue this blocks while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns the item inside a [`PushError`] if the queue has been closed.
    pub fn push(&self, item: T) -> Result<(), PushError<T>> {
        match &self.sender {
            Some(sender) => sender.send(item).map_err(|e| PushError(e.into_inner())),
            None => Err(PushError(item)),
        }
    }

    /// Signals that no more items will be pushed. Idempotent.
    pub fn close(&mut self) {
        self.sender.take();
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }

    /// Returns a handle that workers use to take items from this queue.
    #[must_use]
    pub fn consumer(&self) -> QueueConsumer<T> {
        QueueConsumer {
            receiver: self.receiver.clone(),
        }
    }

    /// Number of items currently queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if no items are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// The capacity limit, or `None` for an unbounded queue.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        self.receiver.capacity()
    }
}

/// The worker side of a [`WorkQueue`].
#[derive(Debug, Clone)]
pub struct QueueConsumer<T> {
    receiver: Receiver<T>,
}

impl<T> QueueConsumer<T> {
    /// Takes the next item, blocking while the queue is open and empty.
    ///
    /// Returns `None` (STOP) only when the queue is closed and every queued
    /// item has been taken.
    #[must_use]
    pub fn pop(&self) -> Option<T> {
        self.receiver.recv().ok()
    }
}

impl<T> Iterator for QueueConsumer<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        thread,
        time::Duration,
    };

    #[test]
    fn fifo_order_for_single_consumer() {
        let mut queue = WorkQueue::unbounded();
        let consumer = queue.consumer();
        for i in 0..5 {
            queue.push(i).unwrap();
        }
        queue.close();
        assert_eq!(consumer.collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn close_is_idempotent() {
        let mut queue: WorkQueue<u8> = WorkQueue::unbounded();
        assert!(!queue.is_closed());
        queue.close();
        queue.close();
        assert!(queue.is_closed());
        assert_eq!(queue.consumer().pop(), None);
    }

    #[test]
    fn push_after_close_is_rejected() {
        let mut queue = WorkQueue::unbounded();
        let consumer = queue.consumer();
        queue.push("first").unwrap();
        queue.close();

        let err = queue.push("late").unwrap_err();
        assert_eq!(err.into_inner(), "late");

        assert_eq!(consumer.pop(), Some("first"));
        assert_eq!(consumer.pop(), None);
    }

    #[test]
    fn items_queued_before_close_are_drained_before_stop() {
        const ITEMS: usize = 1_000;
        const WORKERS: usize = 4;

        let mut queue = WorkQueue::unbounded();
        for i in 0..ITEMS {
            queue.push(i).unwrap();
        }
        queue.close();
        assert_eq!(queue.len(), ITEMS);

        let delivered = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                let consumer = queue.consumer();
                let delivered = Arc::clone(&delivered);
                thread::spawn(move || {
                    while consumer.pop().is_some() {
                        delivered.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(delivered.load(Ordering::SeqCst), ITEMS);
        assert!(queue.is_empty());
    }

    #[test]
    fn close_wakes_blocked_consumers() {
        let mut queue: WorkQueue<u32> = WorkQueue::unbounded();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let consumer = queue.consumer();
                thread::spawn(move || consumer.pop())
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        queue.close();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), None);
        }
    }

    #[test]
    fn dropping_the_queue_closes_it() {
        let queue = WorkQueue::unbounded();
        let consumer = queue.consumer();
        queue.push(7).unwrap();
        drop(queue);
        assert_eq!(consumer.pop(), Some(7));
        assert_eq!(consumer.pop(), None);
    }

    #[test]
    fn bounded_queue_applies_backpressure() {
        let mut queue = WorkQueue::bounded(2);
        assert_eq!(queue.capacity(), Some(2));
        let consumer = queue.consumer();

        let reader = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            consumer.collect::<Vec<_>>()
        });

        // The third push blocks until the reader starts draining.
        for i in 0..10 {
            queue.push(i).unwrap();
        }
        queue.close();

        assert_eq!(reader.join().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let queue: WorkQueue<u8> = WorkQueue::bounded(0);
        assert_eq!(queue.capacity(), Some(1));
        assert_eq!(WorkQueue::<u8>::with_capacity(None).capacity(), None);
    }
}
