//! Counting runs and batches.
//!
//! A run counts one catalog against the whole sequence input. Its queue, pool,
//! tables and progress tracker are created when the run starts and dropped when
//! it ends, so nothing carries over into the next run. A batch is one run per
//! catalog in a directory; a catalog that fails is recorded and the batch moves
//! on.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    thread,
    time::Instant,
};

use bytes::Bytes;
use tracing::{debug, error, info, info_span, warn};

use crate::{
    catalog::{catalog_name, discover_catalogs, load_catalog, Catalog},
    config::{Config, WorkerCount},
    error::KmerTallyError,
    format::Compression,
    input::Input,
    output::{CountSink, DirectorySink},
    pool::CounterPool,
    progress::{Progress, ProgressTracker},
    queue::WorkQueue,
    reader::SequenceSource,
};

/// Number of enqueued reads between two progress callbacks.
pub const PROGRESS_INTERVAL: u64 = 100_000;

/// Lifecycle of a single run.
///
/// `Idle → LoadingCatalog → Counting → Draining → Finalizing → Idle`. Runs
/// handed an already-loaded catalog start at `Counting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run in progress.
    Idle,
    /// Reading and validating the catalog.
    LoadingCatalog,
    /// Workers running; reads being enqueued.
    Counting,
    /// Queue closed; waiting for workers to finish the backlog.
    Draining,
    /// Workers joined; tables merged and counts emitted.
    Finalizing,
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::LoadingCatalog => "loading-catalog",
            Self::Counting => "counting",
            Self::Draining => "draining",
            Self::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

/// Tracks and logs the state of one run. Returns to `Idle` when dropped, on
/// success and failure alike.
struct RunLifecycle {
    catalog: String,
    state: RunState,
}

impl RunLifecycle {
    fn new(catalog: impl Into<String>) -> Self {
        Self {
            catalog: catalog.into(),
            state: RunState::Idle,
        }
    }

    fn enter(&mut self, next: RunState) {
        if next == self.state {
            return;
        }
        debug!(catalog = %self.catalog, from = %self.state, to = %next, "Run state changed");
        self.state = next;
    }
}

impl Drop for RunLifecycle {
    fn drop(&mut self) {
        self.enter(RunState::Idle);
    }
}

/// Engine settings shared by every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Number of counting workers.
    pub workers: WorkerCount,
    /// Bound on reads waiting for a worker; `None` is unbounded.
    pub queue_capacity: Option<usize>,
    /// Compression of the sequence input.
    pub compression: Compression,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new(WorkerCount::available())
    }
}

impl RunOptions {
    /// Options with `workers` workers, an unbounded queue and detected
    /// compression.
    #[must_use]
    pub const fn new(workers: WorkerCount) -> Self {
        Self {
            workers,
            queue_capacity: None,
            compression: Compression::Auto,
        }
    }

    /// Bounds the queue; `None` removes the bound.
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: Option<usize>) -> Self {
        self.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

/// Final counts of one run, in catalog order.
///
/// Every catalog k-mer is present, including those that were never seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KmerCounts {
    kmers: Vec<String>,
    counts: Vec<u64>,
}

impl KmerCounts {
    fn new(kmers: Vec<String>, counts: Vec<u64>) -> Self {
        debug_assert_eq!(kmers.len(), counts.len());
        Self { kmers, counts }
    }

    /// The count for `kmer`, or `None` if it is not in the catalog.
    #[must_use]
    pub fn get(&self, kmer: &str) -> Option<u64> {
        self.kmers
            .iter()
            .position(|k| k == kmer)
            .map(|slot| self.counts[slot])
    }

    /// `(kmer, count)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.kmers
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// The counts alone, in catalog order.
    #[must_use]
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<(String, u64)> {
        self.kmers.into_iter().zip(self.counts).collect()
    }

    #[must_use]
    pub fn into_hashmap(self) -> HashMap<String, u64> {
        self.kmers.into_iter().zip(self.counts).collect()
    }
}

/// Counts `catalog` k-mers across `sequences`.
///
/// Reads are fed to `options.workers` workers as they are pulled from
/// `sequences`. The queue is closed when `sequences` is exhausted or yields its
/// first error, and no count is read before every worker has been joined.
///
/// # Errors
///
/// Returns the first error yielded by `sequences`, after the workers have
/// drained the reads already queued; the partial counts are discarded. Engine
/// faults are reported as [`KmerTallyError::WorkerSpawn`] or
/// [`KmerTallyError::WorkerPanicked`].
pub fn count_catalog<I>(
    catalog: &Catalog,
    sequences: I,
    options: &RunOptions,
) -> Result<KmerCounts, KmerTallyError>
where
    I: IntoIterator<Item = Result<Bytes, KmerTallyError>>,
{
    count_catalog_with_progress(catalog, sequences, options, |_| {})
}

/// Like [`count_catalog`], calling `on_progress` every [`PROGRESS_INTERVAL`]
/// enqueued reads and once more with the final totals.
///
/// # Errors
///
/// See [`count_catalog`].
pub fn count_catalog_with_progress<I, F>(
    catalog: &Catalog,
    sequences: I,
    options: &RunOptions,
    on_progress: F,
) -> Result<KmerCounts, KmerTallyError>
where
    I: IntoIterator<Item = Result<Bytes, KmerTallyError>>,
    F: FnMut(Progress),
{
    let mut lifecycle = RunLifecycle::new(catalog.name());
    count_in_run(catalog, sequences, options, &mut lifecycle, on_progress)
}

/// Counts `catalog` k-mers across in-memory reads.
///
/// # Errors
///
/// Only engine faults; see [`count_catalog`].
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use kmertally::catalog::Catalog;
/// use kmertally::config::WorkerCount;
/// use kmertally::run::count_sequences;
///
/// let catalog = Catalog::new("targets", ["AT", "GG"])?;
/// let reads = [Bytes::from_static(b"ATGGAT")];
/// let counts = count_sequences(&catalog, reads, WorkerCount::new(2)?)?;
///
/// assert_eq!(counts.get("AT"), Some(2));
/// assert_eq!(counts.get("GG"), Some(1));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn count_sequences<I>(
    catalog: &Catalog,
    reads: I,
    workers: WorkerCount,
) -> Result<KmerCounts, KmerTallyError>
where
    I: IntoIterator<Item = Bytes>,
{
    count_catalog(
        catalog,
        reads.into_iter().map(Ok),
        &RunOptions::new(workers),
    )
}

/// Counts `catalog` k-mers across the FASTQ reads of `input`.
///
/// The input is opened before any worker starts.
///
/// # Errors
///
/// Returns [`KmerTallyError::InputUnreadable`] if the input cannot be opened
/// and [`KmerTallyError::InputRead`] if it fails part way through.
pub fn count_input(
    catalog: &Catalog,
    input: &Input,
    options: &RunOptions,
) -> Result<KmerCounts, KmerTallyError> {
    count_input_with_progress(catalog, input, options, |_| {})
}

/// Like [`count_input`], with a progress callback.
///
/// # Errors
///
/// See [`count_input`].
pub fn count_input_with_progress<F>(
    catalog: &Catalog,
    input: &Input,
    options: &RunOptions,
    on_progress: F,
) -> Result<KmerCounts, KmerTallyError>
where
    F: FnMut(Progress),
{
    let source = SequenceSource::open(input, options.compression)?;
    count_catalog_with_progress(catalog, source, options, on_progress)
}

fn count_in_run<I, F>(
    catalog: &Catalog,
    sequences: I,
    options: &RunOptions,
    lifecycle: &mut RunLifecycle,
    mut on_progress: F,
) -> Result<KmerCounts, KmerTallyError>
where
    I: IntoIterator<Item = Result<Bytes, KmerTallyError>>,
    F: FnMut(Progress),
{
    let started = Instant::now();
    let progress = ProgressTracker::new();
    lifecycle.enter(RunState::Counting);

    // The queue lives inside the scope: every early return drops it, which
    // releases the workers before the scope joins them.
    let (joined, source_error) = thread::scope(|scope| {
        let mut queue = WorkQueue::with_capacity(options.queue_capacity);
        let pool = CounterPool::spawn(
            scope,
            options.workers,
            catalog,
            &queue.consumer(),
            &progress,
        )?;

        let mut enqueued = 0u64;
        let mut source_error = None;
        for record in sequences {
            match record {
                Ok(read) => {
                    queue.push(read)?;
                    enqueued += 1;
                    if enqueued % PROGRESS_INTERVAL == 0 {
                        on_progress(progress.snapshot());
                    }
                }
                Err(e) => {
                    source_error = Some(e);
                    break;
                }
            }
        }

        queue.close();
        lifecycle.enter(RunState::Draining);
        Ok::<_, KmerTallyError>((pool.join(), source_error))
    })?;

    if let Some(e) = source_error {
        warn!(catalog = catalog.name(), error = %e, "Discarding counts after input failure");
        return Err(e);
    }
    let table = joined?;

    lifecycle.enter(RunState::Finalizing);
    let totals = progress.snapshot();
    on_progress(totals);

    info!(
        catalog = catalog.name(),
        reads = totals.reads_processed,
        bases = totals.bases_processed,
        kmers = catalog.len(),
        matches = table.total(),
        elapsed = ?started.elapsed(),
        "Counted catalog"
    );

    Ok(KmerCounts::new(catalog.kmers().to_vec(), table.into_vec()))
}

/// Loads the catalog at `catalog_path`, counts it across the configured input
/// and writes the counts through `sink`.
///
/// # Errors
///
/// Any catalog, input, engine or sink error for this catalog.
pub fn process_catalog<S>(
    catalog_path: &Path,
    config: &Config,
    sink: &mut S,
) -> Result<S::Output, KmerTallyError>
where
    S: CountSink,
{
    let mut lifecycle = RunLifecycle::new(catalog_name(catalog_path));
    lifecycle.enter(RunState::LoadingCatalog);
    let catalog = load_catalog(catalog_path)?;

    let source = SequenceSource::open(&config.input, config.options.compression)?;
    let counts = count_in_run(&catalog, source, &config.options, &mut lifecycle, |p| {
        debug!(
            reads = p.reads_processed,
            bases = p.bases_processed,
            "Progress"
        );
    })?;

    sink.write_counts(&catalog, &counts)
}

/// Result of one catalog in a batch.
#[derive(Debug)]
pub struct CatalogOutcome {
    /// The catalog file.
    pub catalog: PathBuf,
    /// The written count table, or why there is none.
    pub result: Result<PathBuf, KmerTallyError>,
}

impl CatalogOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-catalog outcomes of a batch, in processing order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<CatalogOutcome>,
}

impl RunSummary {
    /// Catalogs whose counts were written.
    pub fn succeeded(&self) -> impl Iterator<Item = &CatalogOutcome> {
        self.outcomes.iter().filter(|o| o.is_ok())
    }

    /// Catalogs that produced no output.
    pub fn failed(&self) -> impl Iterator<Item = &CatalogOutcome> {
        self.outcomes.iter().filter(|o| !o.is_ok())
    }

    /// Returns `true` if every catalog succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(CatalogOutcome::is_ok)
    }
}

/// Counts every catalog in `config.kmer_dir` against `config.input`, writing
/// one table per catalog into `config.output_dir`.
///
/// # Errors
///
/// Only batch-level failures: [`KmerTallyError::CatalogDir`] if the catalog
/// directory cannot be listed, and [`KmerTallyError::InputNotRestartable`] if
/// standard input would have to be read for more than one catalog.
/// Per-catalog failures are logged and recorded in the [`RunSummary`].
pub fn run(config: &Config) -> Result<RunSummary, KmerTallyError> {
    let catalogs = discover_catalogs(&config.kmer_dir)?;

    if !config.input.is_restartable() && catalogs.len() > 1 {
        return Err(KmerTallyError::InputNotRestartable {
            catalogs: catalogs.len(),
        });
    }
    if catalogs.is_empty() {
        warn!(dir = %config.kmer_dir.display(), "No catalogs found");
    }

    let _batch_span = info_span!(
        "batch",
        catalogs = catalogs.len(),
        input = %config.input,
        workers = config.options.workers.get()
    )
    .entered();

    let mut sink = DirectorySink::new(&config.output_dir, config.format);
    let mut summary = RunSummary {
        outcomes: Vec::with_capacity(catalogs.len()),
    };
    let mut claimed: HashMap<String, PathBuf> = HashMap::with_capacity(catalogs.len());

    for path in catalogs {
        let _catalog_span = info_span!("catalog", path = %path.display()).entered();

        // `a.csv` and `a.CSV` share an output file; only the first may write it.
        let result = if let Some(first) = claimed.get(&catalog_name(&path)) {
            Err(KmerTallyError::DuplicateCatalogName {
                path: path.clone(),
                first: first.clone(),
            })
        } else {
            claimed.insert(catalog_name(&path), path.clone());
            match process_catalog(&path, config, &mut sink) {
                Err(e) if !e.is_run_local() => return Err(e),
                other => other,
            }
        };
        match &result {
            Ok(output) => info!(output = %output.display(), "Wrote counts"),
            Err(e) => error!(error = %e, "Catalog failed"),
        }

        summary.outcomes.push(CatalogOutcome {
            catalog: path,
            result,
        });
    }

    Ok(summary)
}
