//! Read-only HTTP(S) resources

use crate::compression::{gzip_reader, Compression};
use crate::handle::{Handle, ReadOnly};
use crate::{AccessMode, Error, ResourceUri, Result};
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the blocking client shared by every HTTP handle of an opener
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("uio/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Fetch `uri` with a single GET and return its body as a read-only handle
///
/// The body is decompressed when the path ends in `.gz` or `.gzip`. Nothing is retried.
pub fn open(client: &Client, uri: &ResourceUri, mode: AccessMode) -> Result<Handle> {
    if mode.is_write() {
        warn!("HTTP resources are read-only; ignoring mode {}", mode);
    }

    let shown = uri.redacted();
    info!("Fetching HTTP resource {}", shown);

    let response = client.get(uri.as_str()).send().map_err(|source| {
        error!("Failed to fetch {}: {}", shown, source);
        Error::Http {
            url: shown.clone(),
            source,
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        error!("Received non-2xx response code {} from {}", status.as_u16(), shown);
        return Err(Error::RemoteStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    match response.content_length() {
        Some(length) => debug!("{} answered {} with {} bytes", shown, status, length),
        None => debug!("{} answered {}", shown, status),
    }

    match Compression::from_name(uri.path()) {
        Compression::Gzip => {
            let decoder = gzip_reader(response, &shown)?;
            Ok(Handle::ReadOnly(ReadOnly::new(shown, Box::new(decoder))))
        }
        Compression::None => Ok(Handle::ReadOnly(ReadOnly::new(shown, Box::new(response)))),
    }
}
