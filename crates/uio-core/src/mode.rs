//! Access modes selected by the `mode` query parameter

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// How a resource is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccessMode {
    /// Read an existing resource
    #[default]
    Read,
    /// Create or truncate, then write
    Write,
    /// Create or open, then write at the end
    Append,
}

impl AccessMode {
    /// Name as it appears in a URI query
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Read => "read",
            AccessMode::Write => "write",
            AccessMode::Append => "append",
        }
    }

    /// Whether the mode writes to the resource
    pub fn is_write(&self) -> bool {
        !matches!(self, AccessMode::Read)
    }
}

impl FromStr for AccessMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "read" => Ok(AccessMode::Read),
            "write" => Ok(AccessMode::Write),
            "append" => Ok(AccessMode::Append),
            other => Err(Error::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
