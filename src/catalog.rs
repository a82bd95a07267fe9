//! K-mer catalogs: loading, validation, and discovery.
//!
//! A catalog is a CSV file whose first line is a header and whose first
//! column holds one k-mer per row; any further columns are ignored. A
//! directory of catalogs is processed one catalog at a time against the same
//! sequence input.

use std::{
    fs::{self, File},
    io::Read,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;

use crate::{
    error::KmerTallyError,
    tally::{CountTable, KmerMatcher},
};

/// File extension recognised by [`discover_catalogs`].
pub const CATALOG_EXTENSION: &str = "csv";

/// An ordered, duplicate-free list of non-empty k-mers.
///
/// Catalog order is slot order: the `i`th k-mer is counted in slot `i` of a
/// [`CountTable`] and is written `i`th in the output.
///
/// # Example
///
/// ```rust
/// use kmertally::catalog::Catalog;
/// use kmertally::tally::CountTable;
///
/// let catalog = Catalog::new("targets", ["AT", "GG"])?;
/// let mut table = catalog.new_table();
/// catalog.tally(b"ATGGAT", &mut table);
///
/// assert_eq!(table.as_slice(), &[2, 1]);
/// # Ok::<(), kmertally::error::KmerTallyError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Catalog {
    name: String,
    kmers: Vec<String>,
    matchers: Vec<KmerMatcher>,
    slots: FxHashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog named `name` from k-mers in order.
    ///
    /// Repeated k-mers keep their first position.
    ///
    /// # Errors
    ///
    /// Returns [`KmerTallyError::CatalogInvalid`] if any k-mer is empty.
    pub fn new<I, S>(name: impl Into<String>, kmers: I) -> Result<Self, KmerTallyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::empty(name.into());
        for (i, kmer) in kmers.into_iter().enumerate() {
            catalog.push(kmer.into(), || format!("entry {}", i + 1))?;
        }
        Ok(catalog)
    }

    /// Parses a catalog from CSV, skipping the header line and taking the
    /// first column of each row.
    ///
    /// Fields are trimmed. Blank rows are skipped; a row whose first field is
    /// empty but which has other fields is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`KmerTallyError::CatalogUnreadable`] on I/O failure and
    /// [`KmerTallyError::CatalogInvalid`] on malformed CSV or an empty k-mer.
    pub fn from_csv<R: Read>(
        name: impl Into<String>,
        path: &Path,
        reader: R,
    ) -> Result<Self, KmerTallyError> {
        let mut catalog = Self::empty(name.into());
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        for record in csv.records() {
            let record = record.map_err(|e| csv_error(e, path))?;
            let kmer = record.get(0).unwrap_or_default();

            if kmer.is_empty() && record.iter().all(str::is_empty) {
                continue;
            }

            let line = record.position().map_or(0, csv::Position::line);
            catalog
                .push(kmer.to_string(), || format!("line {line}"))
                .map_err(|e| match e {
                    KmerTallyError::CatalogInvalid { details, .. } => {
                        KmerTallyError::CatalogInvalid {
                            details,
                            path: path.to_path_buf(),
                        }
                    }
                    other => other,
                })?;
        }

        Ok(catalog)
    }

    fn empty(name: String) -> Self {
        Self {
            name,
            kmers: Vec::new(),
            matchers: Vec::new(),
            slots: FxHashMap::default(),
        }
    }

    fn push<F>(&mut self, kmer: String, location: F) -> Result<(), KmerTallyError>
    where
        F: FnOnce() -> String,
    {
        if kmer.is_empty() {
            return Err(KmerTallyError::CatalogInvalid {
                details: format!("empty k-mer at {}", location()),
                path: PathBuf::from(&self.name),
            });
        }

        if let Some(&slot) = self.slots.get(&kmer) {
            tracing::warn!(
                catalog = %self.name,
                kmer = %kmer,
                first_slot = slot,
                at = %location(),
                "Ignoring duplicate k-mer"
            );
            return Ok(());
        }

        self.slots.insert(kmer.clone(), self.kmers.len());
        self.matchers.push(KmerMatcher::new(kmer.as_bytes()));
        self.kmers.push(kmer);
        Ok(())
    }

    /// The catalog's name; output files are named after it.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The k-mers in catalog order.
    #[must_use]
    pub fn kmers(&self) -> &[String] {
        &self.kmers
    }

    /// The slot of `kmer`, if it is in the catalog.
    #[must_use]
    pub fn slot(&self, kmer: &str) -> Option<usize> {
        self.slots.get(kmer).copied()
    }

    /// Number of k-mers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kmers.len()
    }

    /// Returns `true` if the catalog has no k-mers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kmers.is_empty()
    }

    /// A zeroed table with one slot per k-mer.
    #[must_use]
    pub fn new_table(&self) -> CountTable {
        CountTable::zeroed(self.len())
    }

    /// Adds the non-overlapping occurrences of every k-mer in `read` to
    /// `table`.
    ///
    /// # Panics
    ///
    /// Panics if `table` was not created for this catalog.
    pub fn tally(&self, read: &[u8], table: &mut CountTable) {
        assert_eq!(table.len(), self.len(), "count table does not match catalog");
        for (slot, matcher) in self.matchers.iter().enumerate() {
            let n = matcher.count_in(read);
            if n > 0 {
                table.add(slot, n);
            }
        }
    }
}

fn csv_error(e: csv::Error, path: &Path) -> KmerTallyError {
    if e.is_io_error() {
        KmerTallyError::CatalogUnreadable {
            source: e.into(),
            path: path.to_path_buf(),
        }
    } else {
        KmerTallyError::CatalogInvalid {
            details: e.to_string(),
            path: path.to_path_buf(),
        }
    }
}

/// The catalog name for `path`: its file name without the final extension.
///
/// ```
/// use kmertally::catalog::catalog_name;
/// use std::path::Path;
///
/// assert_eq!(catalog_name(Path::new("panels/brca.v2.csv")), "brca.v2");
/// ```
#[must_use]
pub fn catalog_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Loads the catalog at `path`, named after the file stem.
///
/// # Errors
///
/// Returns [`KmerTallyError::CatalogUnreadable`] if the file cannot be opened
/// or read, and [`KmerTallyError::CatalogInvalid`] if it is malformed.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog, KmerTallyError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| KmerTallyError::CatalogUnreadable {
        source,
        path: path.to_path_buf(),
    })?;
    let catalog = Catalog::from_csv(catalog_name(path), path, file)?;

    tracing::debug!(catalog = %catalog.name(), kmers = catalog.len(), "Loaded catalog");
    Ok(catalog)
}

/// Lists the catalog files in `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`KmerTallyError::CatalogDir`] if the directory cannot be read.
pub fn discover_catalogs<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, KmerTallyError> {
    let dir = dir.as_ref();
    let dir_error = |source| KmerTallyError::CatalogDir {
        source,
        path: dir.to_path_buf(),
    };

    let mut catalogs = Vec::new();
    for entry in fs::read_dir(dir).map_err(dir_error)? {
        let path = entry.map_err(dir_error)?.path();
        let is_catalog = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(CATALOG_EXTENSION));
        if is_catalog && path.is_file() {
            catalogs.push(path);
        }
    }
    catalogs.sort();
    Ok(catalogs)
}
