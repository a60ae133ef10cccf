//! Tokio runtime construction for the blocking bridge

use crate::{CloudError, Result};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Build the runtime that drives object store futures on behalf of blocking callers.
///
/// The caller owns the returned runtime and shares it with every store it connects;
/// nothing here is cached process-wide.
pub fn build_runtime() -> Result<Arc<Runtime>> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .thread_name("uio-cloud-worker")
        .build()
        .map_err(|e| CloudError::Runtime(format!("Failed to create Tokio runtime: {}", e)))?;

    Ok(Arc::new(runtime))
}
