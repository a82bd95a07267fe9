//! Fuzz target for non-overlapping occurrence counting.
//!
//! The first byte picks the needle length; the needle is taken from the front
//! of the remaining data and searched for in the rest. Checks that:
//! 1. The count agrees with a byte-by-byte reference scan
//! 2. Matches never cover more bytes than the haystack holds

#![no_main]

use kmertally::tally::{count_non_overlapping, KmerMatcher};
use libfuzzer_sys::fuzz_target;

fn reference_count(haystack: &[u8], needle: &[u8]) -> u64 {
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

fuzz_target!(|data: &[u8]| {
    let Some((&len, rest)) = data.split_first() else {
        return;
    };
    let len = usize::from(len % 8) + 1;
    if rest.len() < len {
        return;
    }
    let (needle, haystack) = rest.split_at(len);

    let count = count_non_overlapping(haystack, needle);
    assert_eq!(count, reference_count(haystack, needle));
    assert_eq!(count, KmerMatcher::new(needle).count_in(haystack));
    assert!(count as usize * needle.len() <= haystack.len());
});
