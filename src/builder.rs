//! Builder pattern API for counting catalogs from library code.
//!
//! # Example
//!
//! ```rust,no_run
//! use kmertally::builder::CatalogCounter;
//! use kmertally::catalog::load_catalog;
//!
//! let catalog = load_catalog("catalogs/targets.csv")?;
//! let counts = CatalogCounter::new()
//!     .workers(8)?
//!     .queue_capacity(4096)
//!     .count(&catalog, "reads.fastq.gz")?;
//!
//! for (kmer, count) in counts.iter() {
//!     println!("{kmer}: {count}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{io::Write, path::Path};

use bytes::Bytes;

use crate::{
    catalog::Catalog,
    cli::OutputFormat,
    config::WorkerCount,
    error::{KmerTallyError, WorkerCountError},
    format::Compression,
    input::Input,
    output::write_counts,
    progress::Progress,
    run::{count_catalog, count_input_with_progress, KmerCounts, RunOptions},
};

/// A builder for configuring catalog counting runs.
///
/// Use [`CatalogCounter::new()`] to create a builder, configure it with the
/// fluent API, then call one of the `count` methods.
#[derive(Debug, Clone)]
pub struct CatalogCounter {
    options: RunOptions,
    format: OutputFormat,
}

impl Default for CatalogCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogCounter {
    /// Creates a builder with default settings.
    ///
    /// Default settings:
    /// - `workers`: one per available core
    /// - `queue_capacity`: unbounded
    /// - `compression`: detected from the input
    /// - `format`: CSV
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: RunOptions::default(),
            format: OutputFormat::Csv,
        }
    }

    /// Sets the number of counting workers.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerCountError`] if `workers` is zero.
    ///
    /// # Example
    ///
    /// ```rust
    /// use kmertally::builder::CatalogCounter;
    ///
    /// let counter = CatalogCounter::new().workers(4)?;
    /// assert_eq!(counter.get_workers().get(), 4);
    /// assert!(CatalogCounter::new().workers(0).is_err());
    /// # Ok::<(), kmertally::error::WorkerCountError>(())
    /// ```
    pub fn workers(mut self, workers: usize) -> Result<Self, WorkerCountError> {
        self.options.workers = WorkerCount::new(workers)?;
        Ok(self)
    }

    /// Sets the number of counting workers from a pre-validated count.
    #[must_use]
    pub fn workers_validated(mut self, workers: WorkerCount) -> Self {
        self.options.workers = workers;
        self
    }

    /// Bounds the number of reads waiting for a worker. A capacity of zero is
    /// treated as one.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.options.queue_capacity = Some(capacity);
        self
    }

    /// Sets the input compression instead of detecting it.
    #[must_use]
    pub fn compression(mut self, compression: Compression) -> Self {
        self.options.compression = compression;
        self
    }

    /// Sets the format used by [`count_to_writer`](Self::count_to_writer).
    #[must_use]
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Counts `catalog` across the FASTQ file at `path` (`-` for stdin).
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or a worker fails.
    pub fn count<P>(&self, catalog: &Catalog, path: P) -> Result<KmerCounts, KmerTallyError>
    where
        P: AsRef<Path>,
    {
        self.count_with_progress(catalog, path, |_| {})
    }

    /// Like [`count`](Self::count), reporting progress to `callback`.
    ///
    /// # Errors
    ///
    /// See [`count`](Self::count).
    pub fn count_with_progress<P, F>(
        &self,
        catalog: &Catalog,
        path: P,
        callback: F,
    ) -> Result<KmerCounts, KmerTallyError>
    where
        P: AsRef<Path>,
        F: FnMut(Progress),
    {
        let input = Input::from_path(path.as_ref());
        count_input_with_progress(catalog, &input, &self.options, callback)
    }

    /// Counts `catalog` across in-memory reads.
    ///
    /// # Errors
    ///
    /// Only worker failures.
    ///
    /// # Example
    ///
    /// ```rust
    /// use bytes::Bytes;
    /// use kmertally::builder::CatalogCounter;
    /// use kmertally::catalog::Catalog;
    ///
    /// let catalog = Catalog::new("targets", ["AA"])?;
    /// let counts = CatalogCounter::new()
    ///     .workers(2)?
    ///     .count_sequences(&catalog, [Bytes::from_static(b"AAAA")])?;
    /// assert_eq!(counts.get("AA"), Some(2));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn count_sequences<I>(
        &self,
        catalog: &Catalog,
        reads: I,
    ) -> Result<KmerCounts, KmerTallyError>
    where
        I: IntoIterator<Item = Bytes>,
    {
        count_catalog(catalog, reads.into_iter().map(Ok), &self.options)
    }

    /// Counts and writes the table to `writer` in the configured format.
    ///
    /// # Errors
    ///
    /// Returns an error if counting fails or the writer fails.
    pub fn count_to_writer<P, W>(
        &self,
        catalog: &Catalog,
        path: P,
        writer: W,
    ) -> Result<(), KmerTallyError>
    where
        P: AsRef<Path>,
        W: Write,
    {
        let counts = self.count(catalog, path)?;
        write_counts(writer, &counts, self.format)
    }

    /// The engine settings this builder will run with.
    #[must_use]
    pub fn options(&self) -> RunOptions {
        self.options
    }

    #[must_use]
    pub fn get_workers(&self) -> WorkerCount {
        self.options.workers
    }

    #[must_use]
    pub fn get_queue_capacity(&self) -> Option<usize> {
        self.options.queue_capacity
    }

    #[must_use]
    pub fn get_compression(&self) -> Compression {
        self.options.compression
    }

    #[must_use]
    pub fn get_format(&self) -> OutputFormat {
        self.format
    }
}
