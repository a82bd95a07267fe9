//! Writing count tables.
//!
//! Every catalog k-mer is written, in catalog order, zero counts included.

use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{catalog::Catalog, cli::OutputFormat, error::KmerTallyError, run::KmerCounts};

/// Column headers of the CSV and TSV tables.
pub const HEADER: [&str; 2] = ["K-mer", "Count"];

/// A k-mer with its count, used for JSON serialization.
#[derive(Serialize)]
struct KmerCount<'a> {
    kmer: &'a str,
    count: u64,
}

/// Destination for the counts of finished runs.
pub trait CountSink {
    /// What a successful write produces, e.g. the path written.
    type Output;

    /// Emits the final counts of `catalog`.
    ///
    /// # Errors
    ///
    /// Returns an error if the counts cannot be written.
    fn write_counts(
        &mut self,
        catalog: &Catalog,
        counts: &KmerCounts,
    ) -> Result<Self::Output, KmerTallyError>;
}

/// Writes one `<catalog>_counts.<ext>` file per catalog into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    format: OutputFormat,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// The file the counts of catalog `name` are written to.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir
            .join(format!("{name}_counts.{}", self.format.extension()))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn write_file(&self, path: &Path, counts: &KmerCounts) -> Result<(), KmerTallyError> {
        let mut writer = BufWriter::new(File::create(path)?);
        write_table(&mut writer, counts, self.format)?;
        writer.flush()?;
        Ok(())
    }
}

impl CountSink for DirectorySink {
    type Output = PathBuf;

    /// Writes the table, removing any partial file if writing fails.
    fn write_counts(
        &mut self,
        catalog: &Catalog,
        counts: &KmerCounts,
    ) -> Result<PathBuf, KmerTallyError> {
        let path = self.path_for(catalog.name());

        match self.write_file(&path, counts) {
            Ok(()) => Ok(path),
            Err(e) => {
                if let Err(remove) = fs::remove_file(&path) {
                    if remove.kind() != io::ErrorKind::NotFound {
                        tracing::warn!(
                            path = %path.display(),
                            error = %remove,
                            "Could not remove partial output"
                        );
                    }
                }
                let source = match e {
                    KmerTallyError::WriteError { source } => source,
                    KmerTallyError::JsonError { source } => source.into(),
                    other => return Err(other),
                };
                Err(KmerTallyError::OutputUnwritable { source, path })
            }
        }
    }
}

/// Writes the counts of every run to one writer, back to back.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CountSink for WriterSink<W> {
    type Output = ();

    fn write_counts(
        &mut self,
        _catalog: &Catalog,
        counts: &KmerCounts,
    ) -> Result<(), KmerTallyError> {
        write_counts(&mut self.writer, counts, self.format)
    }
}

/// Writes `counts` as a table in `format`.
///
/// ```rust
/// use bytes::Bytes;
/// use kmertally::{catalog::Catalog, cli::OutputFormat, config::WorkerCount};
/// use kmertally::{output::write_counts, run::count_sequences};
///
/// let catalog = Catalog::new("targets", ["AT", "GG"])?;
/// let counts = count_sequences(&catalog, [Bytes::from_static(b"ATAT")], WorkerCount::ONE)?;
///
/// let mut out = Vec::new();
/// write_counts(&mut out, &counts, OutputFormat::Tsv)?;
/// assert_eq!(out, b"K-mer\tCount\nAT\t2\nGG\t0\n");
/// # Ok::<(), kmertally::error::KmerTallyError>(())
/// ```
///
/// # Errors
///
/// Returns [`KmerTallyError::WriteError`] if the writer fails and
/// [`KmerTallyError::JsonError`] if JSON serialization fails.
pub fn write_counts<W: Write>(
    mut writer: W,
    counts: &KmerCounts,
    format: OutputFormat,
) -> Result<(), KmerTallyError> {
    write_table(&mut writer, counts, format)?;
    writer.flush()?;
    Ok(())
}

fn write_table<W: Write>(
    writer: &mut W,
    counts: &KmerCounts,
    format: OutputFormat,
) -> Result<(), KmerTallyError> {
    match format {
        OutputFormat::Csv => write_delimited(writer, counts, b',')?,
        OutputFormat::Tsv => write_delimited(writer, counts, b'\t')?,
        OutputFormat::Json => {
            let json_data: Vec<KmerCount<'_>> = counts
                .iter()
                .map(|(kmer, count)| KmerCount { kmer, count })
                .collect();
            serde_json::to_writer_pretty(&mut *writer, &json_data)
                .map_err(|source| KmerTallyError::JsonError { source })?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn write_delimited<W: Write>(writer: &mut W, counts: &KmerCounts, delimiter: u8) -> io::Result<()> {
    let mut table = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .from_writer(writer);

    table.write_record(HEADER)?;
    for (kmer, count) in counts.iter() {
        table.serialize((kmer, count))?;
    }
    table.flush()
}
