//! Local files and the standard streams

use crate::compression::{archived_name, gzip_reader, gzip_writer, Compression};
use crate::handle::{Handle, ReadOnly, StdStream, WriteOnly};
use crate::{AccessMode, Error, ResourceUri, Result};
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use tracing::{error, info};

/// Path that selects stdin/stdout when given without a scheme
pub const STD_STREAM_PATH: &str = "-";

/// Local path named by `uri`
///
/// Bare paths are used verbatim. With a scheme, the host becomes the first
/// path component, so `file:///tmp/x` is `/tmp/x` and `file://data/x` is `data/x`.
pub fn resolve_path(uri: &ResourceUri) -> PathBuf {
    if uri.scheme().is_empty() {
        PathBuf::from(uri.path())
    } else {
        PathBuf::from(format!(
            "{}/{}",
            uri.host(),
            uri.path().trim_start_matches('/')
        ))
    }
}

/// Open a local file (or the standard streams) under `mode`
pub fn open(uri: &ResourceUri, mode: AccessMode) -> Result<Handle> {
    if uri.scheme().is_empty() && uri.path() == STD_STREAM_PATH {
        info!("Using standard streams");
        return Ok(Handle::Std(StdStream));
    }

    let path = resolve_path(uri);
    let name = path.display().to_string();
    info!("Opening file {} in {} mode", name, mode);

    let file = open_options(mode).open(&path).map_err(|source| {
        error!("Failed to open file {}: {}", name, source);
        Error::Open {
            target: path.clone(),
            source,
        }
    })?;

    match Compression::from_name(&name) {
        Compression::None => Ok(Handle::Direct(file)),
        Compression::Gzip if mode.is_write() => {
            let encoder = gzip_writer(file, archived_name(&name).as_deref());
            Ok(Handle::WriteOnly(WriteOnly::new(name, encoder)))
        }
        Compression::Gzip => {
            let decoder = gzip_reader(file, &name)?;
            Ok(Handle::ReadOnly(ReadOnly::new(name, Box::new(decoder))))
        }
    }
}

fn open_options(mode: AccessMode) -> OpenOptions {
    let mut options = File::options();
    match mode {
        AccessMode::Read => options.read(true),
        AccessMode::Write => options.read(true).write(true).create(true).truncate(true),
        AccessMode::Append => options.read(true).append(true).create(true),
    };
    options
}
