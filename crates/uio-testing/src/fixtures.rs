//! Common test fixtures for uio testing

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Content used by the round-trip scenarios
pub const HELLO_WORLD: &[u8] = b"Hello World!";

/// Compress `data` into a single gzip member
pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("write to in-memory encoder");
    encoder.finish().expect("finish in-memory encoder")
}

/// Decompress every gzip member in `data`
pub fn gunzip(data: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::new();
    MultiGzDecoder::new(data)
        .read_to_end(&mut decoded)
        .expect("decode gzip fixture");
    decoded
}

/// Multi-line text for line-oriented tests
pub fn sample_lines(count: usize) -> String {
    (0..count).map(|i| format!("Line {}: test data\n", i)).collect()
}
