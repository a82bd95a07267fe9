use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kmertally::catalog::Catalog;
use kmertally::config::WorkerCount;
use kmertally::input::Input;
use kmertally::run::{count_input, count_sequences, RunOptions};
use kmertally::tally::{count_non_overlapping, KmerMatcher};
use std::io::Write;
use tempfile::NamedTempFile;

const READ: &str = "ACGTTGCAAGGCTTACCGATGCATGCAATTGGCCAAGTCAGTCATGCATGCAGTACGTAGCTAGCTAGCATCGATCGATGCTAGC";

fn read_of(len: usize) -> Bytes {
    Bytes::from(READ.repeat(len / READ.len() + 1)[..len].to_string())
}

fn bench_count_non_overlapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_non_overlapping");

    for k in [5, 11, 21, 31] {
        let read = read_of(150);
        let needle = read[40..40 + k].to_vec();

        group.bench_with_input(BenchmarkId::from_parameter(k), &needle, |b, needle| {
            b.iter(|| count_non_overlapping(black_box(&read), black_box(needle)))
        });
    }

    group.finish();
}

fn bench_matcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("KmerMatcher::count_in");

    for len in [150, 1_000, 10_000] {
        let read = read_of(len);
        let matcher = KmerMatcher::new(b"GCATGCA");

        group.bench_with_input(BenchmarkId::from_parameter(len), &read, |b, read| {
            b.iter(|| matcher.count_in(black_box(read)))
        });
    }

    group.finish();
}

fn catalog(size: usize) -> Catalog {
    let kmers: Vec<String> = (0..size)
        .map(|i| READ[i % (READ.len() - 21)..][..21].to_string())
        .collect();
    Catalog::new("bench", kmers).unwrap()
}

fn bench_count_sequences(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_sequences");
    group.sample_size(20);

    let catalog = catalog(50);
    let reads: Vec<Bytes> = (0..5_000).map(|_| read_of(150)).collect();

    for workers in [1, 2, 4, 8] {
        let workers = WorkerCount::new(workers).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(workers), &reads, |b, reads| {
            b.iter(|| count_sequences(&catalog, reads.iter().cloned(), workers))
        });
    }

    group.finish();
}

fn bench_count_input_small(c: &mut Criterion) {
    let mut group = c.benchmark_group("count_input");

    let mut file = NamedTempFile::new().unwrap();
    for i in 0..1_000 {
        writeln!(file, "@read{i}\n{}\n+\n{}", read_of(150), "I".repeat(150)).unwrap();
    }
    file.flush().unwrap();
    let input = Input::File(file.path().to_path_buf());
    let catalog = catalog(20);

    for workers in [1, 4] {
        let options = RunOptions::new(WorkerCount::new(workers).unwrap());
        group.bench_with_input(BenchmarkId::from_parameter(workers), &options, |b, options| {
            b.iter(|| count_input(black_box(&catalog), &input, options))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_count_non_overlapping,
    bench_matcher,
    bench_count_sequences,
    bench_count_input_small,
);

criterion_main!(benches);
