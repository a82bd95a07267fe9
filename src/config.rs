//! Validated run configuration.

use std::{
    fs,
    io::{Error as IoError, ErrorKind},
    num::NonZeroUsize,
    path::PathBuf,
    thread,
};

use crate::{
    cli::{Args, OutputFormat},
    error::{KmerTallyError, WorkerCountError},
    input::Input,
    run::RunOptions,
};

/// Number of counting worker threads, at least one.
///
/// ```
/// use kmertally::config::WorkerCount;
///
/// assert_eq!(WorkerCount::new(8)?.get(), 8);
/// assert!(WorkerCount::new(0).is_err());
/// # Ok::<(), kmertally::error::WorkerCountError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkerCount(NonZeroUsize);

impl WorkerCount {
    /// Minimum number of workers.
    pub const MIN: usize = 1;

    /// A single worker.
    pub const ONE: Self = Self(NonZeroUsize::MIN);

    /// Validates a worker count.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerCountError`] if `workers` is zero.
    pub fn new(workers: usize) -> Result<Self, WorkerCountError> {
        NonZeroUsize::new(workers)
            .map(Self)
            .ok_or(WorkerCountError {
                workers,
                min: Self::MIN,
            })
    }

    /// One worker per available core, or one if that cannot be determined.
    #[must_use]
    pub fn available() -> Self {
        thread::available_parallelism().map_or(Self::ONE, Self)
    }

    /// The count as a `usize`.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for WorkerCount {
    fn default() -> Self {
        Self::available()
    }
}

impl std::fmt::Display for WorkerCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a batch run needs: where the catalogs are, where the reads come
/// from, where the counts go, and how to count.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the catalog CSV files.
    pub kmer_dir: PathBuf,
    /// The FASTQ reads.
    pub input: Input,
    /// Directory receiving one count table per catalog.
    pub output_dir: PathBuf,
    /// Count table format.
    pub format: OutputFormat,
    /// Engine settings for every run.
    pub options: RunOptions,
}

impl Config {
    /// Validates the directories, creating the output directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`KmerTallyError::CatalogDir`] if `kmer_dir` is not a readable
    /// directory and [`KmerTallyError::OutputDir`] if `output_dir` cannot be
    /// created.
    pub fn new(
        kmer_dir: PathBuf,
        input: Input,
        output_dir: PathBuf,
        format: OutputFormat,
        options: RunOptions,
    ) -> Result<Self, KmerTallyError> {
        match fs::metadata(&kmer_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(KmerTallyError::CatalogDir {
                    source: IoError::new(ErrorKind::InvalidInput, "not a directory"),
                    path: kmer_dir,
                })
            }
            Err(source) => {
                return Err(KmerTallyError::CatalogDir {
                    source,
                    path: kmer_dir,
                })
            }
        }

        if !output_dir.is_dir() {
            tracing::info!(path = %output_dir.display(), "Creating output directory");
            fs::create_dir_all(&output_dir).map_err(|source| KmerTallyError::OutputDir {
                source,
                path: output_dir.clone(),
            })?;
        }

        Ok(Self {
            kmer_dir,
            input,
            output_dir,
            format,
            options,
        })
    }

    /// Builds a configuration from parsed command-line arguments.
    ///
    /// # Errors
    ///
    /// See [`Config::new`]; also fails on a zero thread count.
    pub fn from_args(args: &Args) -> Result<Self, KmerTallyError> {
        let workers = match args.threads {
            Some(n) => WorkerCount::new(n)?,
            None => WorkerCount::available(),
        };

        let options = RunOptions::new(workers)
            .with_queue_capacity(args.queue_capacity)
            .with_compression(args.compression);

        Self::new(
            args.kmer_dir.clone(),
            Input::from_path(&args.fastq_file),
            args.output_dir.clone(),
            args.format,
            options,
        )
    }
}
