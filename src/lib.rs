//! Count the k-mers of one or more catalogs across the reads of a FASTQ file.
//!
//! Each catalog is a CSV list of k-mers. For every catalog, the reads of a
//! (possibly gzip-compressed) FASTQ file are handed to a pool of worker threads
//! through a closable work queue; each worker counts the non-overlapping
//! occurrences of every catalog k-mer in the reads it takes, and the per-worker
//! tables are summed once all workers have stopped.
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use kmertally::{catalog::Catalog, config::WorkerCount, run::count_sequences};
//!
//! let catalog = Catalog::new("targets", ["AT", "GG"])?;
//! let reads = [Bytes::from_static(b"ATGGAT"), Bytes::from_static(b"AAAA")];
//! let counts = count_sequences(&catalog, reads, WorkerCount::new(4)?)?;
//!
//! assert_eq!(counts.into_vec(), vec![("AT".to_string(), 2), ("GG".to_string(), 1)]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod input;
pub mod output;
pub mod pool;
pub mod progress;
pub mod queue;
pub mod reader;
pub mod run;
pub mod tally;
