//! StagedWriter - write-back staging for whole-object uploads
//!
//! Object stores only replace whole objects, so writes land in a local
//! temporary file and the file is uploaded once, when the handle is closed.

use crate::{CloudError, CloudStore, ObjectLocation, Result, RetryPolicy};
use object_store::{PutPayload, WriteMultipart};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, error, info, warn};

/// Staged objects up to this size are uploaded with a single PUT
pub const MULTIPART_THRESHOLD: u64 = 16 * 1024 * 1024;

/// Part size of multipart uploads; also the read buffer over the staging file
pub const PART_SIZE: usize = 8 * 1024 * 1024;

/// Parts of one multipart upload that may be in flight at once
const MAX_CONCURRENT_PARTS: usize = 4;

/// Framing layered over the staging file (plain bytes or a compressor)
pub trait StagingSink: Write + Send {
    /// Write any trailing framing and hand back the staging file
    fn finish(self: Box<Self>) -> io::Result<File>;
}

impl StagingSink for File {
    fn finish(self: Box<Self>) -> io::Result<File> {
        Ok(*self)
    }
}

/// Lifecycle of a staged handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingState {
    /// Open, nothing written yet; closing skips the upload
    Unmodified,
    /// Open with at least one write; closing uploads
    Modified,
    /// Terminal, whatever the outcome of the upload
    Closed,
}

/// A read-write handle that stages an object locally and uploads it on close
pub struct StagedWriter {
    store: CloudStore,
    location: ObjectLocation,
    /// Writer over the staging file, taken on close
    sink: Option<Box<dyn StagingSink>>,
    /// Second handle to the staging file; shares the cursor with the sink's file
    reader: Option<File>,
    /// Deletes the staging file when closed or dropped
    staging: Option<TempPath>,
    staging_path: PathBuf,
    retry: RetryPolicy,
    multipart_threshold: u64,
    state: StagingState,
}

impl StagedWriter {
    /// Stage plain bytes for `location`
    pub fn create(
        store: CloudStore,
        location: ObjectLocation,
        retry: RetryPolicy,
        staging_dir: Option<&Path>,
    ) -> Result<Self> {
        Self::create_with(store, location, retry, staging_dir, |file| {
            Ok(Box::new(file) as Box<dyn StagingSink>)
        })
    }

    /// Stage bytes for `location` through the sink built by `wrap`
    pub fn create_with<F>(
        store: CloudStore,
        location: ObjectLocation,
        retry: RetryPolicy,
        staging_dir: Option<&Path>,
        wrap: F,
    ) -> Result<Self>
    where
        F: FnOnce(File) -> io::Result<Box<dyn StagingSink>>,
    {
        let mut builder = tempfile::Builder::new();
        builder.prefix("s3-");
        let temp = match staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        let (file, staging) = temp.into_parts();
        let staging_path = staging.to_path_buf();
        let reader = file.try_clone()?;
        let sink = wrap(file)?;

        info!(
            "Opened temporary file {} for writes to {}",
            staging_path.display(),
            location
        );

        Ok(StagedWriter {
            store,
            location,
            sink: Some(sink),
            reader: Some(reader),
            staging: Some(staging),
            staging_path,
            retry,
            multipart_threshold: MULTIPART_THRESHOLD,
            state: StagingState::Unmodified,
        })
    }

    /// Upload staged files larger than `bytes` in parts instead of one PUT
    pub fn with_multipart_threshold(mut self, bytes: u64) -> Self {
        self.multipart_threshold = bytes;
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> StagingState {
        self.state
    }

    /// Whether any write happened
    pub fn is_modified(&self) -> bool {
        self.state == StagingState::Modified
    }

    /// Path of the local staging file
    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    /// Destination of the upload
    pub fn location(&self) -> &ObjectLocation {
        &self.location
    }

    /// Finish the local writer, upload if anything was written, and remove the staging file
    ///
    /// The staging file is removed on every path. Calling `close` again is a no-op.
    ///
    /// # Errors
    /// Returns [`CloudError::UploadFailed`] once every attempt of the retry policy has failed,
    /// or an I/O error if the staged bytes could not be finalized.
    pub fn close(&mut self) -> Result<()> {
        let previous = std::mem::replace(&mut self.state, StagingState::Closed);
        if previous == StagingState::Closed {
            debug!("{} already closed", self.location);
            return Ok(());
        }

        let finished = match self.sink.take() {
            Some(sink) => sink.finish().and_then(|mut file| file.flush()),
            None => Ok(()),
        };
        self.reader = None;

        let result = match finished {
            Err(e) => {
                error!("Failed to finalize staging file for {}: {}", self.location, e);
                Err(CloudError::Io(e))
            }
            Ok(()) if previous == StagingState::Unmodified => {
                info!("No modifications detected, skipping upload of {}", self.location);
                Ok(())
            }
            Ok(()) => self.upload(),
        };

        self.remove_staging();
        result
    }

    fn upload(&self) -> Result<()> {
        let size = fs::metadata(&self.staging_path)?.len();
        info!("Uploading {} bytes to {}", size, self.location);

        let outcome = self.retry.run(|attempt| {
            debug!("Upload attempt {} for {}", attempt, self.location);
            self.store.runtime().block_on(self.put_staged(size))
        });

        match outcome {
            Ok(()) => {
                info!("Successfully uploaded {}", self.location);
                Ok(())
            }
            Err(exhausted) => {
                error!(
                    "Giving up on {} after {} attempts: {}",
                    self.location, exhausted.attempts, exhausted.last_error
                );
                Err(CloudError::UploadFailed {
                    attempts: exhausted.attempts,
                    source: exhausted.last_error,
                })
            }
        }
    }

    /// One upload attempt, reading the staging file from the start
    async fn put_staged(&self, size: u64) -> object_store::Result<()> {
        let store = self.store.store();
        let key = &self.location.key;
        let mut file = File::open(&self.staging_path).map_err(staging_error)?;

        if size <= self.multipart_threshold {
            let mut data = Vec::with_capacity(size as usize);
            file.read_to_end(&mut data).map_err(staging_error)?;
            store.put(key, PutPayload::from(data)).await?;
            return Ok(());
        }

        debug!("Starting multipart upload for {}", self.location);
        let upload = store.put_multipart(key).await?;
        let mut parts = WriteMultipart::new_with_chunk_size(upload, PART_SIZE);
        let mut buffer = vec![0u8; PART_SIZE];

        loop {
            let n = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    if let Err(abort) = parts.abort().await {
                        warn!("Failed to abort multipart upload of {}: {}", self.location, abort);
                    }
                    return Err(staging_error(e));
                }
            };
            parts.wait_for_capacity(MAX_CONCURRENT_PARTS).await?;
            parts.write(&buffer[..n]);
        }

        parts.finish().await?;
        Ok(())
    }

    fn remove_staging(&mut self) {
        if let Some(staging) = self.staging.take() {
            if let Err(e) = staging.close() {
                warn!(
                    "Failed to remove staging file {}: {}",
                    self.staging_path.display(),
                    e
                );
            }
        }
    }
}

impl Write for StagedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let sink = self.sink.as_mut().ok_or(CloudError::Closed)?;
        let n = sink.write(buf)?;
        if self.state == StagingState::Unmodified {
            debug!("First write staged for {}", self.location);
            self.state = StagingState::Modified;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.sink.as_mut() {
            Some(sink) => sink.flush(),
            None => Err(CloudError::Closed.into()),
        }
    }
}

/// Reads the staging file from the current write position
///
/// The bytes come back exactly as staged, so for a gzip handle they are the
/// compressed stream, not the text written. A freshly written handle is at the
/// end of its file and reads nothing.
impl Read for StagedWriter {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let reader = self.reader.as_mut().ok_or(CloudError::Closed)?;
        reader.read(buf)
    }
}

fn staging_error(source: io::Error) -> object_store::Error {
    object_store::Error::Generic {
        store: "staging file",
        source: Box::new(source),
    }
}

impl Drop for StagedWriter {
    fn drop(&mut self) {
        if self.state == StagingState::Modified {
            // Can't upload from drop; the staged bytes are discarded with the temp file
            warn!(
                "Staged writes to {} dropped without close; nothing was uploaded",
                self.location
            );
        }
    }
}

impl fmt::Debug for StagedWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedWriter")
            .field("location", &self.location)
            .field("staging_path", &self.staging_path)
            .field("retry", &self.retry)
            .field("multipart_threshold", &self.multipart_threshold)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
