//! Resource providers and the scheme dispatcher

pub mod file;
pub mod http;
pub mod storage;

use std::collections::HashMap;
use tracing::warn;

/// Adapter that serves a URI scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Local files and the standard streams
    File,
    /// HTTP(S) GET
    Http,
    /// S3-compatible object storage
    Storage,
}

/// Immutable scheme → provider table
///
/// Schemes missing from the table, including the empty scheme of a bare
/// path, are served by [`Provider::File`].
#[derive(Debug, Clone)]
pub struct Dispatcher {
    providers: HashMap<String, Provider>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Table for `http`, `https`, `file` and `s3`
    pub fn new() -> Self {
        Self::empty()
            .with_scheme("http", Provider::Http)
            .with_scheme("https", Provider::Http)
            .with_scheme("file", Provider::File)
            .with_scheme("s3", Provider::Storage)
    }

    /// A table with no schemes; everything falls back to files
    pub fn empty() -> Self {
        Dispatcher {
            providers: HashMap::new(),
        }
    }

    /// Route `scheme` to `provider`
    pub fn with_scheme(mut self, scheme: &str, provider: Provider) -> Self {
        self.providers
            .insert(scheme.to_ascii_lowercase(), provider);
        self
    }

    /// Provider registered for `scheme`, falling back to files
    pub fn dispatch(&self, scheme: &str) -> Provider {
        match self.providers.get(scheme) {
            Some(provider) => *provider,
            None => {
                if !scheme.is_empty() {
                    warn!("Unknown scheme '{}', falling back to file", scheme);
                }
                Provider::File
            }
        }
    }

    /// Whether `scheme` has an explicit entry
    pub fn supports(&self, scheme: &str) -> bool {
        self.providers.contains_key(scheme)
    }
}
