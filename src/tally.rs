//! Non-overlapping substring tallying and per-worker count tables.
//!
//! A k-mer is counted left to right: a match at position `p` consumes
//! `p..p + k`, and the next search starts at `p + k`. Overlapping occurrences
//! are therefore counted once per consumed span, so `"AA"` occurs once in
//! `"AAA"` and twice in `"AAAA"`. Matching is exact and case-sensitive.
//!
//! Each worker owns a [`CountTable`] indexed by catalog slot and never shares
//! it while counting; tables are merged once every worker has stopped.

use memchr::memmem::Finder;

/// Counts non-overlapping occurrences of `needle` in `haystack`.
///
/// An empty needle matches nothing.
///
/// # Examples
///
/// ```
/// use kmertally::tally::count_non_overlapping;
///
/// assert_eq!(count_non_overlapping(b"ATGGAT", b"AT"), 2);
/// assert_eq!(count_non_overlapping(b"AAA", b"AA"), 1);
/// assert_eq!(count_non_overlapping(b"AAAA", b"AA"), 2);
/// assert_eq!(count_non_overlapping(b"acgt", b"ACGT"), 0);
/// ```
#[must_use]
pub fn count_non_overlapping(haystack: &[u8], needle: &[u8]) -> u64 {
    KmerMatcher::new(needle).count_in(haystack)
}

/// A precompiled searcher for one k-mer.
#[derive(Debug, Clone)]
pub struct KmerMatcher {
    finder: Finder<'static>,
}

impl KmerMatcher {
    /// Builds a matcher for `kmer`. An empty k-mer matches nothing.
    #[must_use]
    pub fn new(kmer: &[u8]) -> Self {
        Self {
            finder: Finder::new(kmer).into_owned(),
        }
    }

    /// The k-mer this matcher searches for.
    #[must_use]
    pub fn kmer(&self) -> &[u8] {
        self.finder.needle()
    }

    /// Counts non-overlapping occurrences of the k-mer in `read`.
    #[must_use]
    pub fn count_in(&self, read: &[u8]) -> u64 {
        let span = self.finder.needle().len();
        if span == 0 {
            return 0;
        }
        let mut count = 0;
        let mut pos = 0;

        while let Some(offset) = self.finder.find(&read[pos..]) {
            count += 1;
            pos += offset + span;
        }

        count
    }
}

/// One counter per catalog slot.
///
/// # Example
///
/// ```
/// use kmertally::tally::CountTable;
///
/// let mut a = CountTable::zeroed(2);
/// a.add(0, 3);
///
/// let mut b = CountTable::zeroed(2);
/// b.add(1, 4);
///
/// a.merge(&b);
/// assert_eq!(a.as_slice(), &[3, 4]);
/// assert_eq!(a.total(), 7);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountTable {
    counts: Vec<u64>,
}

impl CountTable {
    /// Creates a table of `slots` counters, all zero.
    #[must_use]
    pub fn zeroed(slots: usize) -> Self {
        Self {
            counts: vec![0; slots],
        }
    }

    /// Adds `n` to the counter in `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is out of range.
    #[inline]
    pub fn add(&mut self, slot: usize, n: u64) {
        self.counts[slot] += n;
    }

    /// The counter in `slot`, or `None` if out of range.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<u64> {
        self.counts.get(slot).copied()
    }

    /// Adds every counter of `other` into this table.
    ///
    /// # Panics
    ///
    /// Panics if the tables have different sizes; both must come from the
    /// same catalog.
    pub fn merge(&mut self, other: &CountTable) {
        assert_eq!(
            self.counts.len(),
            other.counts.len(),
            "count tables from different catalogs"
        );
        for (mine, theirs) in self.counts.iter_mut().zip(&other.counts) {
            *mine += theirs;
        }
    }

    /// Sum of all counters.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Returns `true` if the table has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The counters in slot order.
    #[must_use]
    pub fn as_slice(&self) -> &[u64] {
        &self.counts
    }

    pub(crate) fn into_vec(self) -> Vec<u64> {
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_disjoint_matches() {
        assert_eq!(count_non_overlapping(b"ATGGAT", b"AT"), 2);
        assert_eq!(count_non_overlapping(b"ATGGAT", b"GG"), 1);
    }

    #[test]
    fn overlapping_matches_are_consumed() {
        assert_eq!(count_non_overlapping(b"AAA", b"AA"), 1);
        assert_eq!(count_non_overlapping(b"AAAA", b"AA"), 2);
        assert_eq!(count_non_overlapping(b"AAAAA", b"AAA"), 1);
        assert_eq!(count_non_overlapping(b"ATATAT", b"ATA"), 1);
    }

    #[test]
    fn no_match() {
        assert_eq!(count_non_overlapping(b"CCCC", b"AT"), 0);
        assert_eq!(count_non_overlapping(b"", b"AT"), 0);
        assert_eq!(count_non_overlapping(b"A", b"AT"), 0);
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert_eq!(count_non_overlapping(b"atgAT", b"AT"), 1);
    }

    #[test]
    fn no_ambiguity_expansion() {
        assert_eq!(count_non_overlapping(b"ANGT", b"ACGT"), 0);
        assert_eq!(count_non_overlapping(b"ANGT", b"ANGT"), 1);
    }

    #[test]
    fn empty_needle_matches_nothing() {
        assert_eq!(count_non_overlapping(b"ACGT", b""), 0);
    }

    #[test]
    fn empty_matcher_counts_nothing() {
        let matcher = KmerMatcher::new(b"");
        assert_eq!(matcher.count_in(b"ACGT"), 0);
        assert_eq!(matcher.count_in(b""), 0);
    }

    #[test]
    fn match_at_end_of_read() {
        assert_eq!(count_non_overlapping(b"CCAT", b"AT"), 1);
        assert_eq!(count_non_overlapping(b"AT", b"AT"), 1);
    }

    #[test]
    fn matcher_reports_its_kmer() {
        let matcher = KmerMatcher::new(b"GATTACA");
        assert_eq!(matcher.kmer(), b"GATTACA");
        assert_eq!(matcher.count_in(b"GATTACAGATTACA"), 2);
    }

    #[test]
    fn table_starts_at_zero() {
        let table = CountTable::zeroed(3);
        assert_eq!(table.as_slice(), &[0, 0, 0]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.total(), 0);
        assert_eq!(table.get(3), None);
    }

    #[test]
    fn merge_is_commutative() {
        let mut a = CountTable::zeroed(2);
        a.add(0, 1);
        a.add(1, 5);
        let mut b = CountTable::zeroed(2);
        b.add(0, 2);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        assert_eq!(ab, ba);
        assert_eq!(ab.as_slice(), &[3, 5]);
    }

    #[test]
    #[should_panic(expected = "count tables from different catalogs")]
    fn merge_rejects_mismatched_tables() {
        let mut a = CountTable::zeroed(2);
        a.merge(&CountTable::zeroed(3));
    }
}
