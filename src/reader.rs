//! Streaming FASTQ sequence source.
//!
//! The source yields the sequence line of every four-line FASTQ record, one
//! record at a time, straight from a (possibly gzip-compressed) stream. It is a
//! single-pass iterator: reading the input again means opening it again.
//!
//! Records are taken purely by position: line 2 of each group of four, with the
//! trailing `\n` or `\r\n` removed. Headers, separators and qualities are never
//! inspected, and a trailing incomplete record still yields its sequence line
//! if it has one.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, ErrorKind, Read},
};

use bytes::Bytes;
use flate2::read::MultiGzDecoder;

use crate::{error::KmerTallyError, format::Compression, input::Input};

const READ_BUFFER_SIZE: usize = 128 * 1024;
const LINES_PER_RECORD: u64 = 4;
const SEQUENCE_LINE: u64 = 2;

/// Lazy, single-pass iterator over the sequence lines of a FASTQ stream.
///
/// # Example
///
/// ```rust
/// use kmertally::{format::Compression, input::Input, reader::SequenceSource};
/// use std::io::Cursor;
///
/// let fastq = Cursor::new(b"@r1\nACGT\n+\nIIII\n@r2\nGGCC\n+\nIIII\n".to_vec());
/// let reads: Vec<_> = SequenceSource::from_reader(fastq, Input::Stdin, Compression::Auto)?
///     .collect::<Result<_, _>>()?;
///
/// assert_eq!(reads, vec!["ACGT", "GGCC"]);
/// # Ok::<(), kmertally::error::KmerTallyError>(())
/// ```
pub struct SequenceSource {
    reader: Box<dyn BufRead + Send>,
    input: Input,
    compression: Compression,
    line: Vec<u8>,
    lines_read: u64,
    records_read: u64,
    failed: bool,
}

impl SequenceSource {
    /// Opens `input` for reading.
    ///
    /// The first block of the (decompressed) stream is read eagerly, so a
    /// missing file or a corrupt gzip header is reported here, before any
    /// counting work is started.
    ///
    /// # Errors
    ///
    /// Returns [`KmerTallyError::InputUnreadable`] if the input cannot be opened
    /// or its first block cannot be decoded.
    pub fn open(input: &Input, compression: Compression) -> Result<Self, KmerTallyError> {
        let raw: Box<dyn Read + Send> = match input {
            Input::File(path) => {
                let file = File::open(path).map_err(|source| KmerTallyError::InputUnreadable {
                    source,
                    input: input.clone(),
                })?;
                Box::new(file)
            }
            Input::Stdin => Box::new(io::stdin()),
        };
        Self::from_reader(raw, input.clone(), compression)
    }

    /// Wraps an already-open byte stream. `input` is only used to label errors.
    ///
    /// # Errors
    ///
    /// Returns [`KmerTallyError::InputUnreadable`] if the first block of the
    /// stream cannot be read or decoded.
    pub fn from_reader<R>(
        reader: R,
        input: Input,
        compression: Compression,
    ) -> Result<Self, KmerTallyError>
    where
        R: Read + Send + 'static,
    {
        let unreadable = |source| KmerTallyError::InputUnreadable {
            source,
            input: input.clone(),
        };

        let mut raw = BufReader::with_capacity(READ_BUFFER_SIZE, reader);
        let resolved = compression.resolve(raw.fill_buf().map_err(unreadable)?);

        let mut reader: Box<dyn BufRead + Send> = if resolved.is_gzip() {
            Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                MultiGzDecoder::new(raw),
            ))
        } else {
            Box::new(raw)
        };
        reader.fill_buf().map_err(unreadable)?;

        tracing::debug!(input = %input, compression = %resolved, "Opened sequence input");

        Ok(Self {
            reader,
            input,
            compression: resolved,
            line: Vec::new(),
            lines_read: 0,
            records_read: 0,
            failed: false,
        })
    }

    /// The input this source reads from.
    #[must_use]
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// The compression in effect after auto-detection.
    #[must_use]
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Number of input lines consumed so far.
    #[must_use]
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Number of sequence records produced so far.
    #[must_use]
    pub fn records_read(&self) -> u64 {
        self.records_read
    }
}

impl Iterator for SequenceSource {
    type Item = Result<Bytes, KmerTallyError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.lines_read += 1;
                    if self.lines_read % LINES_PER_RECORD == SEQUENCE_LINE {
                        self.records_read += 1;
                        return Some(Ok(Bytes::copy_from_slice(trim_line_end(&self.line))));
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    self.failed = true;
                    return Some(Err(KmerTallyError::InputRead {
                        source,
                        input: self.input.clone(),
                    }));
                }
            }
        }
    }
}

impl std::fmt::Debug for SequenceSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceSource")
            .field("input", &self.input)
            .field("compression", &self.compression)
            .field("lines_read", &self.lines_read)
            .field("records_read", &self.records_read)
            .finish_non_exhaustive()
    }
}

/// Strips one trailing `\n` and then one trailing `\r`.
fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
