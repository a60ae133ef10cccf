//! The entry point: URI in, handle out

use crate::handle::Handle;
use crate::provider::storage::StorageBackend;
use crate::provider::{file, http, Dispatcher, Provider};
use crate::{AccessMode, ResourceUri, Result, UioConfig};
use reqwest::blocking::Client;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info};
use uio_cloud::{Connector, S3Connector};

/// Opens URIs as [`Handle`]s
///
/// Owns the HTTP client, the runtime that drives object storage, and the
/// storage connector. Each is built on the first open that needs it and then
/// shared by every handle this opener returns; handles stay valid after the
/// opener is dropped.
///
/// Handles block the calling thread. HTTP and storage handles drive their own
/// runtimes, so inside async code open and use them from
/// `tokio::task::spawn_blocking`.
pub struct Opener {
    dispatcher: Dispatcher,
    http: OnceLock<Client>,
    storage: StorageBackend,
    config: UioConfig,
}

impl Opener {
    /// Opener with default configuration talking to real S3 endpoints
    pub fn new() -> Result<Self> {
        Self::with_config(UioConfig::default())
    }

    /// Opener with the given configuration talking to real S3 endpoints
    pub fn with_config(config: UioConfig) -> Result<Self> {
        Self::with_connector(config, Arc::new(S3Connector))
    }

    /// Opener whose storage clients come from `connector`
    ///
    /// # Errors
    /// Returns [`Error::Config`](crate::Error::Config) for settings that fail
    /// [`UioConfig::validate`].
    pub fn with_connector(config: UioConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;
        let storage =
            StorageBackend::new(connector, config.retry_policy(), config.staging.dir.clone());

        Ok(Opener {
            dispatcher: Dispatcher::new(),
            http: OnceLock::new(),
            storage,
            config,
        })
    }

    /// Replace the scheme table
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn config(&self) -> &UioConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn http_client(&self) -> Result<&Client> {
        if let Some(client) = self.http.get() {
            return Ok(client);
        }
        let client = http::build_client(self.config.http_timeout())?;
        debug!("Built HTTP client with timeout {:?}", self.config.http_timeout());
        Ok(self.http.get_or_init(|| client))
    }

    /// Open `uri`, reading unless its `mode` parameter says otherwise
    pub fn open(&self, uri: &str) -> Result<Handle> {
        self.open_with_mode(uri, AccessMode::Read)
    }

    /// Open `uri` in `default_mode` unless its `mode` parameter says otherwise
    ///
    /// # Errors
    /// Malformed URIs, unknown modes and any failure of the selected provider.
    pub fn open_with_mode(&self, uri: &str, default_mode: AccessMode) -> Result<Handle> {
        let parsed = match ResourceUri::parse(uri) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Invalid URI: {}", e);
                return Err(e);
            }
        };

        info!("Opening resource {}", parsed);
        debug!(
            "Parsed URI: scheme={:?} host={:?} path={:?} query={:?}",
            parsed.scheme(),
            parsed.host(),
            parsed.path(),
            parsed.redacted_query()
        );

        let mode = match parsed.query_value("mode").filter(|m| !m.is_empty()) {
            Some(requested) => requested.parse::<AccessMode>().map_err(|e| {
                error!("{}", e);
                e
            })?,
            None => default_mode,
        };

        let provider = self.dispatcher.dispatch(parsed.scheme());
        let result = match provider {
            Provider::File => file::open(&parsed, mode),
            Provider::Http => self
                .http_client()
                .and_then(|client| http::open(client, &parsed, mode)),
            Provider::Storage => self.storage.open(&parsed, mode),
        };

        match &result {
            Ok(handle) => info!("Opened {} as {} handle ({} mode)", parsed, handle.kind(), mode),
            Err(e) => error!("Failed to open {}: {}", parsed, e),
        }
        result
    }
}

impl fmt::Debug for Opener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opener")
            .field("dispatcher", &self.dispatcher)
            .field("storage", &self.storage)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Open `uri` with the process-wide default [`Opener`]
///
/// The default opener is created on first use and lives until the process
/// exits, so its HTTP client and runtime are shared by every call.
pub fn open(uri: &str) -> Result<Handle> {
    static DEFAULT: OnceLock<Opener> = OnceLock::new();

    let opener = match DEFAULT.get() {
        Some(opener) => opener,
        None => {
            let opener = Opener::new()?;
            DEFAULT.get_or_init(|| opener)
        }
    };
    opener.open(uri)
}
