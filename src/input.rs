//! Sequence input location: a FASTQ file or standard input.
//!
//! # Example
//!
//! ```rust
//! use kmertally::input::Input;
//! use std::path::Path;
//!
//! let input = Input::from_path(Path::new("reads.fastq.gz"));
//! assert!(input.is_file());
//!
//! let input = Input::from_path(Path::new("-"));
//! assert!(input.is_stdin());
//! ```

use std::path::{Path, PathBuf};

/// Where the FASTQ reads come from.
///
/// A file can be re-opened for every catalog of a batch; standard input can be
/// consumed only once, so a batch reading from stdin is limited to a single
/// catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Input {
    /// Read from a file at the specified path.
    File(PathBuf),
    /// Read from standard input.
    #[default]
    Stdin,
}

impl Input {
    /// Creates an `Input` from a path, treating `-` as standard input.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        if path.as_os_str() == "-" {
            Self::Stdin
        } else {
            Self::File(path.to_path_buf())
        }
    }

    /// Returns `true` if this input is stdin.
    #[must_use]
    pub const fn is_stdin(&self) -> bool {
        matches!(self, Self::Stdin)
    }

    /// Returns `true` if this input is a file.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Returns `true` if the input can be opened again for another run.
    #[must_use]
    pub const fn is_restartable(&self) -> bool {
        self.is_file()
    }

    /// Returns the file path if this is a file input.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Stdin => None,
        }
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Self::from_path(&path)
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Self::from_path(path)
    }
}

impl std::fmt::Display for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stdin => write!(f, "<stdin>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_stdin() {
        let input = Input::from_path(Path::new("-"));
        assert!(input.is_stdin());
        assert!(!input.is_restartable());
        assert!(input.as_path().is_none());
    }

    #[test]
    fn from_path_file() {
        let input = Input::from_path(Path::new("reads.fq.gz"));
        assert!(input.is_file());
        assert!(input.is_restartable());
        assert_eq!(input.as_path(), Some(Path::new("reads.fq.gz")));
    }

    #[test]
    fn from_pathbuf_dash_is_stdin() {
        let input: Input = PathBuf::from("-").into();
        assert!(input.is_stdin());
    }

    #[test]
    fn display() {
        assert_eq!(Input::Stdin.to_string(), "<stdin>");
        assert_eq!(
            Input::File(PathBuf::from("sample_R1.fastq.gz")).to_string(),
            "sample_R1.fastq.gz"
        );
    }
}
