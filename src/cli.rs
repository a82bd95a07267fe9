//! Command-line interface definition.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::format::Compression;

/// Count the k-mers of every catalog in a directory across the reads of a FASTQ file.
#[derive(Parser, Debug)]
#[command(name = "kmertally")]
#[command(version, author, about, long_about = None)]
pub struct Args {
    /// Directory of k-mer catalogs (CSV with a header, k-mers in the first column)
    #[arg(long, alias = "kmer_dir", value_name = "DIR")]
    pub kmer_dir: PathBuf,

    /// FASTQ file to count in, gzip-compressed or plain ("-" for stdin)
    #[arg(long, alias = "fastq_file", value_name = "FILE")]
    pub fastq_file: PathBuf,

    /// Directory receiving one <catalog>_counts table per catalog
    #[arg(long, alias = "output_dir", value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Number of counting threads [default: number of available cores]
    #[arg(short, long, value_parser = parse_threads)]
    pub threads: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    pub format: OutputFormat,

    /// Input compression
    #[arg(long, value_enum, default_value = "auto")]
    pub compression: Compression,

    /// Maximum number of reads waiting for a worker [default: unbounded]
    #[arg(long, value_parser = parse_capacity)]
    pub queue_capacity: Option<usize>,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for count tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Comma-separated values with a `K-mer,Count` header
    #[default]
    Csv,
    /// Tab-separated values with a `K-mer<TAB>Count` header
    Tsv,
    /// JSON array of `{"kmer", "count"}` objects
    Json,
}

impl OutputFormat {
    /// File extension for tables in this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Json => "json",
        }
    }
}

fn parse_threads(s: &str) -> Result<usize, String> {
    let threads: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if threads == 0 {
        return Err("at least one thread is required".to_string());
    }
    Ok(threads)
}

fn parse_capacity(s: &str) -> Result<usize, String> {
    let capacity: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if capacity == 0 {
        return Err("queue capacity must be at least 1".to_string());
    }
    Ok(capacity)
}
