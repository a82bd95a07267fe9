//! Error types for kmertally.
//!
//! Every failure that can end a run is a variant of [`KmerTallyError`]. Errors
//! local to one catalog are recorded against that catalog and never stop the
//! remaining catalogs of a batch.

use std::path::PathBuf;
use thiserror::Error;

use crate::input::Input;

/// Errors that can occur in kmertally operations.
#[derive(Debug, Error)]
pub enum KmerTallyError {
    /// The catalog file could not be opened.
    #[error("failed to read k-mer catalog '{path}': {source}")]
    CatalogUnreadable {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// The catalog holds a malformed entry. For catalogs built in memory,
    /// `path` is the catalog name.
    #[error("invalid k-mer catalog '{path}': {details}")]
    CatalogInvalid { details: String, path: PathBuf },

    /// Another catalog of the same batch already writes to this catalog's
    /// output file.
    #[error("catalog '{path}' has the same name as '{first}' and would overwrite its counts")]
    DuplicateCatalogName { path: PathBuf, first: PathBuf },

    /// The catalog directory could not be listed.
    #[error("failed to list catalog directory '{path}': {source}")]
    CatalogDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// The sequence input could not be opened.
    #[error("failed to open sequence input '{input}': {source}")]
    InputUnreadable {
        #[source]
        source: std::io::Error,
        input: Input,
    },

    /// Reading or decompressing the sequence input failed part way through.
    #[error("failed to read sequence input '{input}': {source}")]
    InputRead {
        #[source]
        source: std::io::Error,
        input: Input,
    },

    /// Standard input can only be consumed once.
    #[error("standard input cannot be re-read for {catalogs} catalogs; pass a file path instead")]
    InputNotRestartable { catalogs: usize },

    /// The count table could not be written.
    #[error("failed to write counts to '{path}': {source}")]
    OutputUnwritable {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// The output directory could not be created.
    #[error("failed to create output directory '{path}': {source}")]
    OutputDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Invalid worker count.
    #[error("invalid worker count {workers}: at least {min} worker is required")]
    InvalidWorkerCount { workers: usize, min: usize },

    /// A worker thread could not be started.
    #[error("failed to spawn counting worker: {source}")]
    WorkerSpawn {
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked; its partial counts are lost.
    #[error("counting worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    /// An item was offered to a queue that had already been closed.
    #[error("work queue was closed before all reads were enqueued")]
    QueueClosed,

    /// Failed to write output to a caller-supplied writer.
    #[error("failed to write output: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize JSON output.
    #[error("failed to serialize JSON: {source}")]
    JsonError {
        #[source]
        source: serde_json::Error,
    },
}

impl KmerTallyError {
    /// Returns `true` if the error belongs to a single catalog's run rather
    /// than to the batch as a whole.
    #[must_use]
    pub fn is_run_local(&self) -> bool {
        !matches!(
            self,
            Self::CatalogDir { .. }
                | Self::OutputDir { .. }
                | Self::InputNotRestartable { .. }
                | Self::InvalidWorkerCount { .. }
        )
    }
}

/// Error for an invalid worker count.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("worker count {workers} is out of range: at least {min} worker is required")]
pub struct WorkerCountError {
    /// The invalid count that was provided.
    pub workers: usize,
    /// Minimum valid worker count.
    pub min: usize,
}

/// Returned by [`WorkQueue::push`](crate::queue::WorkQueue::push) after the
/// queue has been closed. Carries the rejected item back to the caller.
#[derive(PartialEq, Eq)]
pub struct PushError<T>(pub T);

impl<T> PushError<T> {
    /// Consumes the error, returning the item that could not be queued.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PushError(..)")
    }
}

impl<T> std::fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("pushing onto a closed work queue")
    }
}

impl<T> std::error::Error for PushError<T> {}

impl<T> From<PushError<T>> for KmerTallyError {
    fn from(_: PushError<T>) -> Self {
        KmerTallyError::QueueClosed
    }
}

impl From<std::io::Error> for KmerTallyError {
    fn from(source: std::io::Error) -> Self {
        KmerTallyError::WriteError { source }
    }
}

impl From<serde_json::Error> for KmerTallyError {
    fn from(source: serde_json::Error) -> Self {
        KmerTallyError::JsonError { source }
    }
}

impl From<WorkerCountError> for KmerTallyError {
    fn from(err: WorkerCountError) -> Self {
        KmerTallyError::InvalidWorkerCount {
            workers: err.workers,
            min: err.min,
        }
    }
}
