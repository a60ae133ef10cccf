use crate::{CloudError, CloudStore, ObjectLocation, Result};
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::{StreamExt, TryStreamExt};
use std::fmt;
use std::io::{self, Read};
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::debug;

type ObjectStream = BoxStream<'static, io::Result<Bytes>>;

/// A sequential reader over a remote object
///
/// The object body is streamed straight from the store as the caller reads;
/// nothing is buffered locally beyond the chunk in flight.
pub struct CloudReader {
    location: ObjectLocation,
    /// Size reported by the store when the download started
    size: u64,
    /// Bytes handed to the caller so far
    bytes_read: u64,
    inner: SyncIoBridge<StreamReader<ObjectStream, Bytes>>,
    /// Keeps the client and its runtime alive while the body streams
    _store: CloudStore,
}

impl CloudReader {
    /// Start a streaming download of `location`
    ///
    /// # Errors
    /// Returns the store error if the object cannot be fetched (missing object,
    /// unreachable endpoint, rejected credentials). Nothing is retried.
    pub fn open(store: &CloudStore, location: ObjectLocation) -> Result<Self> {
        let result = store
            .runtime()
            .block_on(async { store.store().get(&location.key).await })
            .map_err(CloudError::ObjectStore)?;

        let size = result.meta.size as u64;
        debug!("Streaming {} ({} bytes)", location, size);

        let stream: ObjectStream = result.into_stream().map_err(io::Error::from).boxed();
        let inner = SyncIoBridge::new_with_handle(
            StreamReader::new(stream),
            store.runtime().handle().clone(),
        );

        Ok(CloudReader {
            location,
            size,
            bytes_read: 0,
            inner,
            _store: store.clone(),
        })
    }

    /// Get the size of the object
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Get the number of bytes read so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Get the location being read
    pub fn location(&self) -> &ObjectLocation {
        &self.location
    }
}

impl Read for CloudReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        Ok(n)
    }
}

impl fmt::Debug for CloudReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudReader")
            .field("location", &self.location)
            .field("size", &self.size)
            .field("bytes_read", &self.bytes_read)
            .finish_non_exhaustive()
    }
}
