//! Object stores with injected faults

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use object_store::path::Path;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore, PutMultipartOpts,
    PutOptions, PutPayload, PutResult, Result,
};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Wraps a store, failing the first N uploads and counting every upload call
///
/// Whole-object puts and multipart starts count as uploads; reads and listings pass through.
#[derive(Debug)]
pub struct FlakyStore {
    inner: Arc<dyn ObjectStore>,
    failures_remaining: AtomicU32,
    put_calls: AtomicU32,
}

impl FlakyStore {
    /// Fail the first `failures` put calls, then delegate to `inner`
    pub fn new(inner: Arc<dyn ObjectStore>, failures: u32) -> Self {
        Self {
            inner,
            failures_remaining: AtomicU32::new(failures),
            put_calls: AtomicU32::new(0),
        }
    }

    /// Never fail; only count put calls
    pub fn counting(inner: Arc<dyn ObjectStore>) -> Self {
        Self::new(inner, 0)
    }

    /// Fail every put call
    pub fn always_failing(inner: Arc<dyn ObjectStore>) -> Self {
        Self::new(inner, u32::MAX)
    }

    /// Number of put calls seen so far, failed or not
    pub fn put_calls(&self) -> u32 {
        self.put_calls.load(Ordering::SeqCst)
    }

    fn begin_upload(&self, location: &Path) -> Result<()> {
        let call = self.put_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.take_failure() {
            return Err(object_store::Error::Generic {
                store: "FlakyStore",
                source: format!("injected failure on put #{} to {}", call, location).into(),
            });
        }
        Ok(())
    }

    fn take_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl fmt::Display for FlakyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlakyStore({})", self.inner)
    }
}

#[async_trait]
impl ObjectStore for FlakyStore {
    async fn put_opts(
        &self,
        location: &Path,
        payload: PutPayload,
        opts: PutOptions,
    ) -> Result<PutResult> {
        self.begin_upload(location)?;
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &Path,
        opts: PutMultipartOpts,
    ) -> Result<Box<dyn MultipartUpload>> {
        self.begin_upload(location)?;
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(&self, location: &Path, options: GetOptions) -> Result<GetResult> {
        self.inner.get_opts(location, options).await
    }

    async fn delete(&self, location: &Path) -> Result<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&Path>) -> BoxStream<'_, Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(&self, prefix: Option<&Path>) -> Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}
