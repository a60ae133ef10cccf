//! Error types for uio-core

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use uio_cloud::CloudError;

/// Core error types for the uio library
#[derive(Error, Debug)]
pub enum Error {
    /// The URI could not be parsed, or lacks a part its scheme requires
    #[error("Invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    /// Unknown `mode` query parameter
    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    /// Operation not supported by this kind of handle
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// A local file could not be opened
    #[error("Failed to open {}: {source}", target.display())]
    Open { target: PathBuf, source: io::Error },

    /// The HTTP request did not complete
    #[error("Failed to fetch {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    /// The HTTP server answered with a non-2xx status
    #[error("Received non-2xx response code: {status} {reason}")]
    RemoteStatus { status: u16, reason: String },

    /// Compressed data with a malformed or truncated header
    #[error("Compression format error: {0}")]
    CompressionFormat(String),

    /// Object storage failure
    #[error(transparent)]
    Cloud(#[from] CloudError),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether the resource does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Open { source, .. } | Error::Io(source) => {
                source.kind() == io::ErrorKind::NotFound
            }
            Error::Cloud(e) => e.is_not_found(),
            Error::RemoteStatus { status, .. } => *status == 404,
            _ => false,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(e) => e,
            Error::Open { ref source, .. } => io::Error::new(source.kind(), err),
            Error::Cloud(e) => e.into(),
            Error::UnsupportedOperation(_) => io::Error::new(io::ErrorKind::Unsupported, err),
            other => io::Error::other(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
