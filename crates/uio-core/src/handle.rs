//! The single handle type returned for every kind of resource

use crate::{Error, Result};
use flate2::write::GzEncoder;
use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use tracing::debug;
use uio_cloud::StagedWriter;

/// A readable and/or writable stream over one resource
///
/// Operations a variant cannot perform fail with an [`io::Error`] of kind
/// [`io::ErrorKind::Unsupported`]. Call [`Handle::close`] when done: for
/// compressed targets it writes the trailer, and for objects in storage it
/// performs the upload.
#[derive(Debug)]
pub enum Handle {
    /// HTTP bodies, object downloads and decompressing readers
    ReadOnly(ReadOnly),
    /// Compressing writer over a local file
    WriteOnly(WriteOnly),
    /// Local file opened with the access mode's flags
    Direct(File),
    /// Stdin for reads, stdout for writes
    Std(StdStream),
    /// Object staged in a temporary file, uploaded on close
    Staged(StagedWriter),
}

impl Handle {
    /// Short name of the variant, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Handle::ReadOnly(_) => "read-only",
            Handle::WriteOnly(_) => "write-only",
            Handle::Direct(_) => "file",
            Handle::Std(_) => "standard stream",
            Handle::Staged(_) => "staged object",
        }
    }

    /// Release the resource, finishing any deferred work
    ///
    /// # Errors
    /// Fails if a compressed trailer cannot be written or a staged upload
    /// exhausts its retries. The resource is released either way.
    pub fn close(self) -> Result<()> {
        match self {
            Handle::ReadOnly(reader) => {
                debug!("Closing {}", reader.source);
                Ok(())
            }
            Handle::WriteOnly(writer) => writer.finish(),
            Handle::Direct(mut file) => Ok(file.flush()?),
            Handle::Std(mut std) => Ok(std.flush()?),
            Handle::Staged(mut staged) => Ok(staged.close()?),
        }
    }
}

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Handle::ReadOnly(reader) => reader.read(buf),
            Handle::WriteOnly(writer) => Err(unsupported("read", &writer.target)),
            Handle::Direct(file) => file.read(buf),
            Handle::Std(std) => std.read(buf),
            Handle::Staged(staged) => staged.read(buf),
        }
    }
}

impl Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Handle::ReadOnly(reader) => Err(unsupported("write", &reader.source)),
            Handle::WriteOnly(writer) => writer.encoder.write(buf),
            Handle::Direct(file) => file.write(buf),
            Handle::Std(std) => std.write(buf),
            Handle::Staged(staged) => staged.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Handle::ReadOnly(_) => Ok(()),
            Handle::WriteOnly(writer) => writer.encoder.flush(),
            Handle::Direct(file) => file.flush(),
            Handle::Std(std) => std.flush(),
            Handle::Staged(staged) => staged.flush(),
        }
    }
}

fn unsupported(operation: &str, resource: &str) -> io::Error {
    Error::UnsupportedOperation(format!("{} is not supported for {}", operation, resource)).into()
}

/// A reader that refuses writes
pub struct ReadOnly {
    source: String,
    reader: Box<dyn Read + Send>,
}

impl ReadOnly {
    pub fn new(source: impl Into<String>, reader: Box<dyn Read + Send>) -> Self {
        ReadOnly {
            source: source.into(),
            reader,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Read for ReadOnly {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for ReadOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnly")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// A compressing writer over a local file that refuses reads
pub struct WriteOnly {
    target: String,
    encoder: GzEncoder<File>,
}

impl WriteOnly {
    pub fn new(target: impl Into<String>, encoder: GzEncoder<File>) -> Self {
        WriteOnly {
            target: target.into(),
            encoder,
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Write the gzip trailer and flush the file
    fn finish(self) -> Result<()> {
        let mut file = self.encoder.finish().map_err(Error::Io)?;
        file.flush()?;
        debug!("Finished gzip stream for {}", self.target);
        Ok(())
    }
}

impl fmt::Debug for WriteOnly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteOnly")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// The process's standard streams: reads come from stdin, writes go to stdout
#[derive(Debug, Default)]
pub struct StdStream;

impl Read for StdStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::stdin().lock().read(buf)
    }
}

impl Write for StdStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}
