//! Error types for uio-cloud

use thiserror::Error;

/// Failures of the object storage layer
#[derive(Error, Debug)]
pub enum CloudError {
    /// The store rejected or failed a request
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// The client for a bucket could not be built
    #[error("Failed to create object store client for bucket '{bucket}': {source}")]
    Connect {
        /// Bucket the client was built for
        bucket: String,
        /// Builder failure
        source: object_store::Error,
    },

    /// Local I/O on the staging file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing bucket or key
    #[error("Invalid object location: {0}")]
    InvalidLocation(String),

    /// Missing or bad storage setting
    #[error("Configuration error: {0}")]
    Config(String),

    /// The async runtime could not be started
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Every upload attempt failed; carries the last cause
    #[error("Failed to upload object after {attempts} attempts: {source}")]
    UploadFailed {
        /// Attempts made before giving up
        attempts: u32,
        /// Error of the final attempt
        source: object_store::Error,
    },

    /// Write to a staged handle after close
    #[error("Staged object handle is already closed")]
    Closed,
}

/// Result alias for uio-cloud
pub type Result<T> = std::result::Result<T, CloudError>;

impl CloudError {
    /// Whether the store reported the object as missing
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CloudError::ObjectStore(object_store::Error::NotFound { .. })
        )
    }
}

impl From<CloudError> for std::io::Error {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::Io(io_err) => io_err,
            CloudError::ObjectStore(store_err) => store_err.into(),
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}
