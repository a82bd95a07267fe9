//! Input compression detection and selection.
//!
//! FASTQ inputs are normally gzip-compressed, but plain text is accepted too.
//! With [`Compression::Auto`] the choice is made from the first bytes of the
//! stream rather than from the file name.

use clap::ValueEnum;

/// The two-byte magic number that opens every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression of the sequence input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Compression {
    /// Detect gzip from the stream's magic bytes, otherwise read plain text.
    #[default]
    Auto,
    /// Gzip, possibly made of several concatenated members.
    Gzip,
    /// Uncompressed text.
    Plain,
}

impl Compression {
    /// Detects the compression from the leading bytes of a stream.
    ///
    /// # Examples
    ///
    /// ```
    /// use kmertally::format::Compression;
    ///
    /// assert_eq!(Compression::detect(&[0x1f, 0x8b, 0x08]), Compression::Gzip);
    /// assert_eq!(Compression::detect(b"@read1\nACGT\n"), Compression::Plain);
    /// assert_eq!(Compression::detect(b""), Compression::Plain);
    /// ```
    #[must_use]
    pub fn detect(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            Self::Gzip
        } else {
            Self::Plain
        }
    }

    /// Resolves `Auto` against the leading bytes of the stream; explicit
    /// choices are returned unchanged.
    ///
    /// ```
    /// use kmertally::format::Compression;
    ///
    /// assert_eq!(Compression::Auto.resolve(b"@r\n"), Compression::Plain);
    /// assert_eq!(Compression::Gzip.resolve(b"@r\n"), Compression::Gzip);
    /// ```
    #[must_use]
    pub fn resolve(self, head: &[u8]) -> Self {
        match self {
            Self::Auto => Self::detect(head),
            other => other,
        }
    }

    /// Returns `true` if this is gzip.
    #[must_use]
    pub fn is_gzip(self) -> bool {
        matches!(self, Self::Gzip)
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Gzip => write!(f, "gzip"),
            Self::Plain => write!(f, "plain"),
        }
    }
}
