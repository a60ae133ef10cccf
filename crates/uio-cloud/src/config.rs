//! Storage endpoint and credential resolution

use crate::{CloudError, Result};
use std::fmt;

/// Environment variable holding the storage endpoint (`host:port` or a full URL)
pub const ENV_ENDPOINT: &str = "S3_ENDPOINT";
/// Environment variable holding the access key
pub const ENV_ACCESS_KEY: &str = "S3_ACCESS_KEY";
/// Environment variable holding the secret key
pub const ENV_SECRET_KEY: &str = "S3_SECRET_KEY";
/// Environment variable selecting plain HTTP toward the endpoint
pub const ENV_INSECURE: &str = "S3_INSECURE";
/// Environment variable holding the signing region
pub const ENV_REGION: &str = "S3_REGION";

const SECRET_MASK: &str = "********";

/// Connection settings for an S3-compatible store
///
/// Values come from the process environment first; URI query parameters
/// (`endpoint`, `access_key`, `secret_key`, `insecure`, `region`) override them.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StorageConfig {
    /// Endpoint, either `host:port` or a URL with a scheme
    pub endpoint: String,
    /// Access key id
    pub access_key: String,
    /// Secret access key
    pub secret_key: String,
    /// Talk plain HTTP to the endpoint
    pub insecure: bool,
    /// Signing region, empty to let the client decide
    pub region: String,
}

impl StorageConfig {
    /// Load the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        let insecure = match get(ENV_INSECURE) {
            Some(value) => parse_bool(ENV_INSECURE, &value)?,
            None => false,
        };

        Ok(Self {
            endpoint: get(ENV_ENDPOINT).unwrap_or_default(),
            access_key: get(ENV_ACCESS_KEY).unwrap_or_default(),
            secret_key: get(ENV_SECRET_KEY).unwrap_or_default(),
            insecure,
            region: get(ENV_REGION).unwrap_or_default(),
        })
    }

    /// Resolve the configuration for one URI: environment first, then the query
    pub fn resolve<'a, I>(query: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        Ok(Self::from_env()?.with_query(query))
    }

    /// Override fields with non-empty query parameters
    pub fn with_query<'a, I>(mut self, query: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (key, value) in query {
            if value.is_empty() {
                continue;
            }
            match key {
                "endpoint" => self.endpoint = value.to_string(),
                "access_key" => self.access_key = value.to_string(),
                "secret_key" => self.secret_key = value.to_string(),
                "insecure" => self.insecure = value != "false",
                "region" => self.region = value.to_string(),
                _ => {}
            }
        }
        self
    }

    /// Endpoint as a URL, adding a scheme to bare `host:port` values
    pub fn endpoint_url(&self) -> Option<String> {
        if self.endpoint.is_empty() {
            return None;
        }
        if self.endpoint.contains("://") {
            return Some(self.endpoint.clone());
        }
        let scheme = if self.insecure { "http" } else { "https" };
        Some(format!("{}://{}", scheme, self.endpoint))
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secret = if self.secret_key.is_empty() {
            ""
        } else {
            SECRET_MASK
        };
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("secret_key", &secret)
            .field("insecure", &self.insecure)
            .field("region", &self.region)
            .finish()
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err(CloudError::Config(format!(
            "{} must be a boolean, got '{}'",
            name, value
        ))),
    }
}
