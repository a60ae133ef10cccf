//! uio - one handle for every resource
//!
//! This library opens local files, HTTP(S) URLs and objects in S3-compatible
//! storage from a URI and returns a single [`Handle`] implementing
//! [`std::io::Read`] and [`std::io::Write`]. Paths ending in `.gz` or `.gzip`
//! are transparently decompressed on read and compressed on write.
//!
//! ```no_run
//! use std::io::{Read, Write};
//!
//! let mut out = uio_core::open("file:///tmp/x.txt?mode=write")?;
//! out.write_all(b"Hello World!")?;
//! out.close()?;
//!
//! let mut content = String::new();
//! uio_core::open("/tmp/x.txt")?.read_to_string(&mut content)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compression;
pub mod config;
pub mod error;
pub mod handle;
pub mod mode;
pub mod open;
pub mod provider;
pub mod uri;

pub use config::UioConfig;
pub use error::{Error, Result};
pub use handle::Handle;
pub use mode::AccessMode;
pub use open::{open, Opener};
pub use provider::{Dispatcher, Provider};
pub use uri::ResourceUri;

// Re-export the storage seams for callers that bring their own clients
pub use uio_cloud::{Connector, RetryPolicy, S3Connector, StaticConnector, StorageConfig};
