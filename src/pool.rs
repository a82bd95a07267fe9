//! The pool of counting workers.
//!
//! Each worker pulls reads from a [`QueueConsumer`] until it sees STOP, tallies
//! every catalog k-mer into a table it owns, and hands that table back when it
//! exits. Nothing is shared between workers while they count, so the scan loop
//! takes no lock; the tables are summed after every worker has been joined.
//!
//! Workers are scoped threads: they borrow the catalog and the progress tracker
//! from the run and cannot outlive it.

use std::thread::{self, Scope, ScopedJoinHandle};

use bytes::Bytes;

use crate::{
    catalog::Catalog, config::WorkerCount, error::KmerTallyError, progress::ProgressTracker,
    queue::QueueConsumer, tally::CountTable,
};

/// A fixed set of running counting workers.
pub struct CounterPool<'scope> {
    workers: Vec<ScopedJoinHandle<'scope, CountTable>>,
    slots: usize,
}

impl<'scope> CounterPool<'scope> {
    /// Starts exactly `workers` threads counting `catalog` k-mers in reads taken
    /// from `consumer`.
    ///
    /// If a thread cannot be started, the threads already running keep
    /// waiting on the queue; they stop, and the scope can end, once the queue
    /// is closed or dropped.
    ///
    /// # Errors
    ///
    /// Returns [`KmerTallyError::WorkerSpawn`] if the OS refuses a thread.
    pub fn spawn<'env>(
        scope: &'scope Scope<'scope, 'env>,
        workers: WorkerCount,
        catalog: &'env Catalog,
        consumer: &QueueConsumer<Bytes>,
        progress: &'env ProgressTracker,
    ) -> Result<Self, KmerTallyError> {
        let mut handles = Vec::with_capacity(workers.get());

        for id in 0..workers.get() {
            let consumer = consumer.clone();
            let handle = thread::Builder::new()
                .name(format!("kmertally-worker-{id}"))
                .spawn_scoped(scope, move || count_reads(id, catalog, consumer, progress))
                .map_err(|source| KmerTallyError::WorkerSpawn { source })?;
            handles.push(handle);
        }

        tracing::debug!(workers = handles.len(), kmers = catalog.len(), "Started counting workers");

        Ok(Self {
            workers: handles,
            slots: catalog.len(),
        })
    }

    /// Number of workers in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Returns `true` if the pool has no workers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Waits for every worker to stop and sums their tables.
    ///
    /// Blocks until the queue has been closed and drained. All workers are
    /// joined even if one of them panicked.
    ///
    /// # Errors
    ///
    /// Returns [`KmerTallyError::WorkerPanicked`] naming the first worker that
    /// panicked.
    pub fn join(self) -> Result<CountTable, KmerTallyError> {
        let mut total = CountTable::zeroed(self.slots);
        let mut panicked = None;

        for (id, handle) in self.workers.into_iter().enumerate() {
            match handle.join() {
                Ok(table) => total.merge(&table),
                Err(_) => {
                    panicked.get_or_insert(id);
                }
            }
        }

        match panicked {
            Some(worker) => Err(KmerTallyError::WorkerPanicked { worker }),
            None => Ok(total),
        }
    }
}

fn count_reads(
    id: usize,
    catalog: &Catalog,
    consumer: QueueConsumer<Bytes>,
    progress: &ProgressTracker,
) -> CountTable {
    let mut table = catalog.new_table();
    let mut reads = 0u64;

    while let Some(read) = consumer.pop() {
        catalog.tally(&read, &mut table);
        progress.record_read(read.len() as u64);
        reads += 1;
    }

    tracing::trace!(worker = id, reads, "Worker stopped");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::WorkQueue;

    fn workers(n: usize) -> WorkerCount {
        WorkerCount::new(n).unwrap()
    }

    #[test]
    fn pool_counts_every_queued_read() {
        let catalog = Catalog::new("c", ["AT", "GG"]).unwrap();
        let progress = ProgressTracker::new();

        let table = thread::scope(|scope| {
            let mut queue = WorkQueue::unbounded();
            let pool =
                CounterPool::spawn(scope, workers(3), &catalog, &queue.consumer(), &progress)
                    .unwrap();
            assert_eq!(pool.len(), 3);

            for _ in 0..100 {
                queue.push(Bytes::from_static(b"ATGGAT")).unwrap();
            }
            queue.close();
            pool.join().unwrap()
        });

        assert_eq!(table.as_slice(), &[200, 100]);
        assert_eq!(progress.snapshot().reads_processed, 100);
        assert_eq!(progress.snapshot().bases_processed, 600);
    }

    #[test]
    fn pool_with_no_reads_returns_zeroes() {
        let catalog = Catalog::new("c", ["AT", "GG", "CC"]).unwrap();
        let progress = ProgressTracker::new();

        let table = thread::scope(|scope| {
            let mut queue = WorkQueue::unbounded();
            let pool =
                CounterPool::spawn(scope, workers(2), &catalog, &queue.consumer(), &progress)
                    .unwrap();
            queue.close();
            pool.join().unwrap()
        });

        assert_eq!(table.as_slice(), &[0, 0, 0]);
    }

    #[test]
    fn dropping_the_queue_releases_workers() {
        let catalog = Catalog::new("c", ["A"]).unwrap();
        let progress = ProgressTracker::new();

        let table = thread::scope(|scope| {
            let queue = WorkQueue::bounded(1);
            let pool =
                CounterPool::spawn(scope, workers(2), &catalog, &queue.consumer(), &progress)
                    .unwrap();
            queue.push(Bytes::from_static(b"AAA")).unwrap();
            drop(queue);
            pool.join().unwrap()
        });

        assert_eq!(table.as_slice(), &[3]);
    }
}
