//! Objects in S3-compatible storage
//!
//! Reads stream the object body. Writes go to a local staging file that is
//! uploaded when the handle is closed, and only if something was written.

use crate::compression::{archived_name, gzip_reader, gzip_writer, Compression};
use crate::handle::{Handle, ReadOnly};
use crate::{AccessMode, Error, ResourceUri, Result};
use flate2::write::GzEncoder;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;
use tracing::{debug, error, info};
use uio_cloud::{
    build_runtime, CloudError, CloudReader, CloudStore, Connector, ObjectLocation, RetryPolicy, StagedWriter,
    StagingSink, StorageConfig,
};

/// Everything a storage handle needs besides its URI
///
/// The runtime is started by the first storage open and shared from then on.
pub struct StorageBackend {
    connector: Arc<dyn Connector>,
    runtime: OnceLock<Arc<Runtime>>,
    retry: RetryPolicy,
    staging_dir: Option<PathBuf>,
}

impl StorageBackend {
    pub fn new(
        connector: Arc<dyn Connector>,
        retry: RetryPolicy,
        staging_dir: Option<PathBuf>,
    ) -> Self {
        StorageBackend {
            connector,
            runtime: OnceLock::new(),
            retry,
            staging_dir,
        }
    }

    fn runtime(&self) -> Result<Arc<Runtime>> {
        if let Some(runtime) = self.runtime.get() {
            return Ok(runtime.clone());
        }
        let runtime = build_runtime()?;
        debug!("Started storage runtime");
        Ok(self.runtime.get_or_init(|| runtime).clone())
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Open the object named by `uri`: the host is the bucket, the path is the key
    ///
    /// # Errors
    /// `append` is rejected, since objects can only be replaced whole.
    /// Client construction and download failures are returned as-is; nothing
    /// is retried until the upload on close.
    pub fn open(&self, uri: &ResourceUri, mode: AccessMode) -> Result<Handle> {
        let location = ObjectLocation::new(uri.host(), uri.path()).map_err(|e| match e {
            CloudError::InvalidLocation(reason) => Error::InvalidUri {
                uri: uri.redacted(),
                reason,
            },
            other => Error::Cloud(other),
        })?;

        if mode == AccessMode::Append {
            error!("Cannot append to {}", location);
            return Err(Error::UnsupportedOperation(format!(
                "append is not supported for object storage ({}); objects are replaced whole",
                location
            )));
        }

        let config = StorageConfig::resolve(uri.query_pairs())?;
        info!("Opening object {} in {} mode", location, mode);
        debug!("Storage configuration: {:?}", config);

        let store = CloudStore::connect(
            self.connector.as_ref(),
            &config,
            &location.bucket,
            self.runtime()?,
        )
        .map_err(|e| {
            error!("Failed to connect to storage for {}: {}", location, e);
            e
        })?;

        let compression = Compression::from_name(uri.path());
        match mode {
            AccessMode::Read => self.open_reader(&store, location, compression),
            _ => self.open_writer(store, location, compression),
        }
    }

    fn open_reader(
        &self,
        store: &CloudStore,
        location: ObjectLocation,
        compression: Compression,
    ) -> Result<Handle> {
        let name = location.to_string();
        let reader = CloudReader::open(store, location).map_err(|e| {
            error!("Failed to fetch {}: {}", name, e);
            e
        })?;

        let reader: Box<dyn io::Read + Send> = match compression {
            Compression::Gzip => Box::new(gzip_reader(reader, &name)?),
            Compression::None => Box::new(reader),
        };
        Ok(Handle::ReadOnly(ReadOnly::new(name, reader)))
    }

    fn open_writer(
        &self,
        store: CloudStore,
        location: ObjectLocation,
        compression: Compression,
    ) -> Result<Handle> {
        let staging_dir = self.staging_dir.as_deref();
        let writer = match compression {
            Compression::None => StagedWriter::create(store, location, self.retry, staging_dir)?,
            Compression::Gzip => {
                let name = archived_name(location.key.as_ref());
                StagedWriter::create_with(store, location, self.retry, staging_dir, |file| {
                    let encoder = gzip_writer(file, name.as_deref());
                    Ok(Box::new(GzipStaging(encoder)) as Box<dyn StagingSink>)
                })?
            }
        };
        Ok(Handle::Staged(writer))
    }
}

impl fmt::Debug for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageBackend")
            .field("connector", &self.connector)
            .field("runtime_started", &self.runtime.get().is_some())
            .field("retry", &self.retry)
            .field("staging_dir", &self.staging_dir)
            .finish_non_exhaustive()
    }
}

/// Compresses staged bytes on their way into the staging file
struct GzipStaging(GzEncoder<File>);

impl Write for GzipStaging {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl StagingSink for GzipStaging {
    fn finish(self: Box<Self>) -> io::Result<File> {
        self.0.finish()
    }
}
