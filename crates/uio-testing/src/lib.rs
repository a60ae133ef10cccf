//! Testing utilities and fixtures for uio
//!
//! This crate provides common testing utilities, fixtures, and helpers
//! for exercising uio handles against local files, HTTP servers and object stores.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub mod fixtures;
pub mod http;
pub mod stores;

pub use http::TestHttpServer;
pub use stores::FlakyStore;

/// Creates a temporary test directory with cleanup on drop
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    /// Creates a new temporary test directory
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    /// Returns the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the path of `name` inside the test directory
    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Returns a `file://` URI for `name` inside the test directory
    pub fn file_uri(&self, name: &str) -> String {
        format!("file://{}", self.join(name).display())
    }

    /// Creates a file with the given name and content in the test directory
    pub fn create_file(&self, name: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Lists the entries currently in the test directory
    pub fn entries(&self) -> Result<Vec<PathBuf>> {
        let mut entries = std::fs::read_dir(self.path())?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();
        Ok(entries)
    }
}
