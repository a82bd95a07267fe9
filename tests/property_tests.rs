//! Property-based tests using proptest.
//!
//! These tests verify invariants that should hold across all valid inputs,
//! catching edge cases that might be missed by example-based tests.

use bytes::Bytes;
use kmertally::catalog::Catalog;
use kmertally::config::WorkerCount;
use kmertally::queue::WorkQueue;
use kmertally::tally::count_non_overlapping;
use kmertally::run::count_sequences;
use proptest::prelude::*;
use std::thread;

/// Strategy for generating DNA sequences.
fn dna_sequence(min_len: usize, max_len: usize) -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![Just('A'), Just('C'), Just('G'), Just('T')],
        min_len..=max_len,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for generating a list of distinct k-mers.
fn kmer_list() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set(dna_sequence(1, 4), 1..8)
        .prop_map(|set| set.into_iter().collect())
}

/// Straightforward reference scan: compare at every position, skip past matches.
fn naive_count(haystack: &[u8], needle: &[u8]) -> u64 {
    if needle.is_empty() {
        return 0;
    }
    let mut count = 0;
    let mut pos = 0;
    while pos + needle.len() <= haystack.len() {
        if &haystack[pos..pos + needle.len()] == needle {
            count += 1;
            pos += needle.len();
        } else {
            pos += 1;
        }
    }
    count
}

fn to_reads(seqs: &[String]) -> Vec<Bytes> {
    seqs.iter().map(|s| Bytes::from(s.clone())).collect()
}

proptest! {
    /// The matcher agrees with a byte-by-byte reference scan.
    #[test]
    fn matcher_agrees_with_reference(
        haystack in dna_sequence(0, 200),
        needle in dna_sequence(1, 5),
    ) {
        prop_assert_eq!(
            count_non_overlapping(haystack.as_bytes(), needle.as_bytes()),
            naive_count(haystack.as_bytes(), needle.as_bytes())
        );
    }

    /// Matches never overlap, so they can never cover more than the haystack.
    #[test]
    fn matches_fit_in_haystack(haystack in dna_sequence(0, 200), needle in dna_sequence(1, 5)) {
        let n = count_non_overlapping(haystack.as_bytes(), needle.as_bytes());
        prop_assert!(n as usize * needle.len() <= haystack.len());
    }

    /// Counts do not depend on the number of workers.
    #[test]
    fn worker_count_is_unobservable(
        kmers in kmer_list(),
        reads in proptest::collection::vec(dna_sequence(0, 60), 0..40),
        workers in 2usize..8,
    ) {
        let catalog = Catalog::new("p", kmers).unwrap();
        let single = count_sequences(&catalog, to_reads(&reads), WorkerCount::ONE).unwrap();
        let many =
            count_sequences(&catalog, to_reads(&reads), WorkerCount::new(workers).unwrap())
                .unwrap();
        prop_assert_eq!(single, many);
    }

    /// Every catalog k-mer is reported, in catalog order.
    #[test]
    fn every_kmer_is_reported(
        kmers in kmer_list(),
        reads in proptest::collection::vec(dna_sequence(0, 30), 0..10),
    ) {
        let catalog = Catalog::new("p", kmers.clone()).unwrap();
        let counts =
            count_sequences(&catalog, to_reads(&reads), WorkerCount::new(3).unwrap()).unwrap();

        let reported: Vec<&str> = counts.iter().map(|(kmer, _)| kmer).collect();
        let expected: Vec<&str> = kmers.iter().map(String::as_str).collect();
        prop_assert_eq!(reported, expected);
    }

    /// Totals are the sum of per-read counts; records are never joined.
    #[test]
    fn counts_add_up_per_record(
        kmers in kmer_list(),
        reads in proptest::collection::vec(dna_sequence(0, 40), 0..20),
    ) {
        let catalog = Catalog::new("p", kmers.clone()).unwrap();
        let counts =
            count_sequences(&catalog, to_reads(&reads), WorkerCount::new(4).unwrap()).unwrap();

        for kmer in &kmers {
            let expected: u64 = reads
                .iter()
                .map(|read| naive_count(read.as_bytes(), kmer.as_bytes()))
                .sum();
            prop_assert_eq!(counts.get(kmer), Some(expected));
        }
    }

    /// Everything pushed before `close` is delivered before any consumer stops.
    #[test]
    fn queue_delivers_everything_before_stop(
        items in proptest::collection::vec(any::<u32>(), 0..500),
        consumers in 1usize..6,
    ) {
        let mut queue = WorkQueue::unbounded();
        for item in &items {
            queue.push(*item).unwrap();
        }
        queue.close();

        let mut received: Vec<u32> = thread::scope(|s| {
            let handles: Vec<_> = (0..consumers)
                .map(|_| {
                    let consumer = queue.consumer();
                    s.spawn(move || consumer.collect::<Vec<_>>())
                })
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });

        let mut expected = items.clone();
        received.sort_unstable();
        expected.sort_unstable();
        prop_assert_eq!(received, expected);
    }
}

#[test]
fn boundary_matches_are_not_counted_across_records() {
    let catalog = Catalog::new("p", ["AT"]).unwrap();
    let split = count_sequences(
        &catalog,
        [Bytes::from_static(b"CA"), Bytes::from_static(b"TC")],
        WorkerCount::ONE,
    )
    .unwrap();
    let joined =
        count_sequences(&catalog, [Bytes::from_static(b"CATC")], WorkerCount::ONE).unwrap();

    assert_eq!(split.get("AT"), Some(0));
    assert_eq!(joined.get("AT"), Some(1));
}
