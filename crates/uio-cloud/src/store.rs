use crate::{CloudError, Result, StorageConfig, ENV_ENDPOINT};
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::DynObjectStore;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Identity of one object: bucket plus key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    /// The bucket name
    pub bucket: String,
    /// The object key within the bucket
    pub key: Path,
}

impl ObjectLocation {
    /// Build a location from a URI host and a decoded URI path
    ///
    /// The key is the path without its leading `/`, kept byte for byte. Keys the
    /// store cannot address unchanged (empty segments, `.` or `..`) are rejected.
    pub fn new(bucket: &str, path: &str) -> Result<Self> {
        if bucket.is_empty() {
            return Err(CloudError::InvalidLocation("Missing bucket name".to_string()));
        }

        let key = path.trim_start_matches('/');
        if key.is_empty() {
            return Err(CloudError::InvalidLocation(format!(
                "Missing object key in bucket '{}'",
                bucket
            )));
        }

        let key = Path::parse(key).map_err(|e| {
            CloudError::InvalidLocation(format!("Unsupported object key '{}': {}", key, e))
        })?;

        Ok(ObjectLocation {
            bucket: bucket.to_string(),
            key,
        })
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Builds object store clients for a bucket
pub trait Connector: Send + Sync + fmt::Debug {
    /// Create a client for `bucket` using the resolved configuration
    fn connect(&self, config: &StorageConfig, bucket: &str) -> Result<Arc<DynObjectStore>>;
}

/// Connects to S3 or any S3-compatible endpoint (MinIO, Ceph, ...)
#[derive(Debug, Default, Clone, Copy)]
pub struct S3Connector;

impl Connector for S3Connector {
    fn connect(&self, config: &StorageConfig, bucket: &str) -> Result<Arc<DynObjectStore>> {
        let endpoint = config.endpoint_url().ok_or_else(|| {
            CloudError::Config(format!(
                "No storage endpoint for bucket '{}'; set {} or the `endpoint` query parameter",
                bucket, ENV_ENDPOINT
            ))
        })?;

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_allow_http(config.insecure)
            .with_endpoint(endpoint)
            .with_virtual_hosted_style_request(false);

        if !config.access_key.is_empty() {
            builder = builder
                .with_access_key_id(&config.access_key)
                .with_secret_access_key(&config.secret_key);
        }
        if !config.region.is_empty() {
            builder = builder.with_region(&config.region);
        }

        let store = builder.build().map_err(|source| CloudError::Connect {
            bucket: bucket.to_string(),
            source,
        })?;
        Ok(Arc::new(store))
    }
}

/// Hands out one pre-built store regardless of bucket or credentials
///
/// Useful when the caller already owns a client, e.g. an in-memory store.
#[derive(Debug, Clone)]
pub struct StaticConnector {
    store: Arc<DynObjectStore>,
}

impl StaticConnector {
    /// Wrap an existing store
    pub fn new(store: Arc<DynObjectStore>) -> Self {
        StaticConnector { store }
    }
}

impl Connector for StaticConnector {
    fn connect(&self, _config: &StorageConfig, _bucket: &str) -> Result<Arc<DynObjectStore>> {
        Ok(self.store.clone())
    }
}

/// An object store client paired with the runtime that drives it
#[derive(Clone)]
pub struct CloudStore {
    store: Arc<DynObjectStore>,
    runtime: Arc<Runtime>,
}

impl CloudStore {
    /// Connect a client for `bucket` and attach it to `runtime`
    pub fn connect(
        connector: &dyn Connector,
        config: &StorageConfig,
        bucket: &str,
        runtime: Arc<Runtime>,
    ) -> Result<Self> {
        let store = connector.connect(config, bucket)?;
        Ok(CloudStore { store, runtime })
    }

    /// Create a CloudStore from existing store and runtime
    pub fn from_store_and_runtime(store: Arc<DynObjectStore>, runtime: Arc<Runtime>) -> Self {
        CloudStore { store, runtime }
    }

    /// Get the object store instance
    pub fn store(&self) -> &Arc<DynObjectStore> {
        &self.store
    }

    /// Get the Tokio runtime
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }
}

impl fmt::Debug for CloudStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudStore")
            .field("store", &self.store.to_string())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_from_uri_parts() {
        let location = ObjectLocation::new("uio", "/data/test_read_from_s3.txt").unwrap();
        assert_eq!(location.bucket, "uio");
        assert_eq!(location.key.as_ref(), "data/test_read_from_s3.txt");
        assert_eq!(location.to_string(), "s3://uio/data/test_read_from_s3.txt");
    }

    #[test]
    fn test_invalid_locations() {
        assert!(ObjectLocation::new("", "/key.txt").is_err());
        assert!(ObjectLocation::new("bucket", "/").is_err());
        assert!(ObjectLocation::new("bucket", "").is_err());
    }

    #[test]
    fn test_key_is_kept_verbatim() {
        let location = ObjectLocation::new("uio", "/reports/100%.txt").unwrap();
        assert_eq!(location.key.as_ref(), "reports/100%.txt");

        let location = ObjectLocation::new("uio", "/a {b}#c.txt").unwrap();
        assert_eq!(location.key.as_ref(), "a {b}#c.txt");
    }

    #[test]
    fn test_unaddressable_keys_are_rejected() {
        let err = ObjectLocation::new("uio", "/a//b.txt").unwrap_err();
        assert!(matches!(err, CloudError::InvalidLocation(_)));
        assert!(ObjectLocation::new("uio", "/a/../b.txt").is_err());
    }

    #[test]
    fn test_s3_connector_requires_endpoint() {
        let err = S3Connector
            .connect(&StorageConfig::default(), "bucket")
            .unwrap_err();
        assert!(matches!(err, CloudError::Config(_)));
        assert!(err.to_string().contains(ENV_ENDPOINT));
    }

    #[test]
    fn test_s3_connector_builds_client() {
        let config = StorageConfig {
            endpoint: "127.0.0.1:9000".to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            insecure: true,
            region: "us-east-1".to_string(),
        };
        let store = S3Connector.connect(&config, "uio").unwrap();
        assert!(store.to_string().contains("uio"));
    }
}
