//! Transparent gzip framing selected by name suffix

use crate::{Error, Result};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::GzBuilder;
use std::io::{self, Chain, Cursor, Read, Write};
use std::path::Path;
use tracing::{debug, error};

/// Fixed-size part of a gzip member header
const GZIP_HEADER_LEN: usize = 10;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const DEFLATE_METHOD: u8 = 8;

/// Suffixes that select gzip framing
const GZIP_SUFFIXES: &[&str] = &[".gzip", ".gz"];

/// Framing applied to a resource's bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Bytes pass through untouched
    None,
    /// gzip, one or more members
    Gzip,
}

impl Compression {
    /// Select the framing from the suffix of a path or key; content is never inspected
    pub fn from_name(name: &str) -> Self {
        if GZIP_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            Compression::Gzip
        } else {
            Compression::None
        }
    }

    pub fn is_compressed(&self) -> bool {
        *self != Compression::None
    }
}

/// Name stored in the gzip header: the file name without its compression suffix
pub fn archived_name(name: &str) -> Option<String> {
    let file_name = Path::new(name).file_name()?.to_str()?;
    GZIP_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
}

/// Decoder that has already consumed and checked the fixed header bytes
pub type GzipReader<R> = MultiGzDecoder<Chain<Cursor<[u8; GZIP_HEADER_LEN]>, R>>;

/// Wrap `reader` in a gzip decoder, failing now if the header is malformed or truncated
///
/// Every member of a multi-member stream is decoded, so files that were appended to
/// read back as one stream.
pub fn gzip_reader<R: Read>(mut reader: R, source: &str) -> Result<GzipReader<R>> {
    let mut header = [0u8; GZIP_HEADER_LEN];
    if let Err(e) = reader.read_exact(&mut header) {
        error!("Failed to read gzip header of {}: {}", source, e);
        return Err(match e.kind() {
            io::ErrorKind::UnexpectedEof => {
                Error::CompressionFormat(format!("{}: truncated gzip header", source))
            }
            _ => Error::Io(e),
        });
    }

    if header[..2] != GZIP_MAGIC || header[2] != DEFLATE_METHOD {
        error!("{} does not start with a gzip header", source);
        return Err(Error::CompressionFormat(format!(
            "{}: invalid gzip header",
            source
        )));
    }

    debug!("Decoding gzip stream from {}", source);
    Ok(MultiGzDecoder::new(Cursor::new(header).chain(reader)))
}

/// Wrap `writer` in a gzip encoder whose header records `archived_name`
pub fn gzip_writer<W: Write>(writer: W, archived_name: Option<&str>) -> GzEncoder<W> {
    let builder = match archived_name {
        Some(name) => GzBuilder::new().filename(name),
        None => GzBuilder::new(),
    };
    builder.write(writer, flate2::Compression::default())
}
