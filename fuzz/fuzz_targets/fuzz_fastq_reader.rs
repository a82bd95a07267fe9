//! Fuzz target for the FASTQ sequence reader.
//!
//! Feeds arbitrary bytes (plain or gzip, depending on the magic bytes) through
//! the reader and checks that it never panics and that every record it yields
//! is free of line terminators.

#![no_main]

use kmertally::format::Compression;
use kmertally::input::Input;
use kmertally::reader::SequenceSource;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let reader = Cursor::new(data.to_vec());
    let Ok(source) = SequenceSource::from_reader(reader, Input::Stdin, Compression::Auto) else {
        return;
    };

    for record in source {
        match record {
            Ok(read) => assert!(!read.ends_with(b"\n") && !read.ends_with(b"\r\n")),
            Err(_) => break,
        }
    }
});
