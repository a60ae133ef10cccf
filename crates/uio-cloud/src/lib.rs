//! # uio-cloud
//!
//! Object storage adaptation layer for uio. This crate exposes S3-compatible objects
//! through the synchronous `std::io` traits so the rest of uio never deals with async code.
//!
//! ## Architecture
//!
//! The main abstractions are:
//! - `CloudReader`: streams an object body through `std::io::Read`
//! - `StagedWriter`: stages writes in a local temporary file and uploads the whole
//!   object on close, retrying failed uploads with exponential backoff. Large
//!   staging files are streamed up in parts, never loaded whole.
//!
//! Both use a caller-owned Tokio runtime (see [`build_runtime`]) to drive the async
//! `object_store` API from blocking code.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod config;
mod error;
mod reader;
mod retry;
mod runtime;
mod store;
mod writer;

pub use config::{
    StorageConfig, ENV_ACCESS_KEY, ENV_ENDPOINT, ENV_INSECURE, ENV_REGION, ENV_SECRET_KEY,
};
pub use error::{CloudError, Result};
pub use reader::CloudReader;
pub use retry::{Exhausted, RetryPolicy};
pub use runtime::build_runtime;
pub use store::{CloudStore, Connector, ObjectLocation, S3Connector, StaticConnector};
pub use writer::{StagedWriter, StagingSink, StagingState, MULTIPART_THRESHOLD, PART_SIZE};

// Re-export commonly used types from object_store
pub use object_store::{path::Path as ObjectPath, DynObjectStore, ObjectStore};
