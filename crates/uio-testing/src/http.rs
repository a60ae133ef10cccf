//! In-process HTTP server for tests that use blocking clients

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;

/// Lightweight HTTP test server on a random localhost port
///
/// The server runs on its own Tokio runtime, so the test thread stays free of any
/// async context and can drive blocking HTTP clients against it.
pub struct TestHttpServer {
    base_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
    // Dropped last so the server task is shut down before the runtime goes away
    runtime: Option<Runtime>,
}

impl TestHttpServer {
    /// Bind a listener and start serving `router`
    pub fn start(router: Router) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .thread_name("uio-test-http")
            .build()?;

        // Bound before the task is spawned, so connections queue until it runs
        let listener = runtime.block_on(TcpListener::bind("127.0.0.1:0"))?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        runtime.spawn(async move {
            let server = axum::serve(listener, router).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                eprintln!("test HTTP server failed: {}", e);
            }
        });

        Ok(Self {
            base_url: format!("http://{}", addr),
            shutdown_tx: Some(shutdown_tx),
            runtime: Some(runtime),
        })
    }

    /// Absolute URL for `path` on this server
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Base URL of this server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Drop for TestHttpServer {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use std::io::{Read, Write};
    use std::net::TcpStream;

    #[test]
    fn test_server_answers_plain_request() {
        let server = TestHttpServer::start(Router::new().route("/ping", get(|| async { "pong" })))
            .unwrap();
        let addr = server.base_url().trim_start_matches("http://").to_string();

        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .write_all(b"GET /ping HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.ends_with("pong"));
    }

    #[test]
    fn test_url_joins_path() {
        let server = TestHttpServer::start(Router::new()).unwrap();
        assert!(server.url("/a.txt").ends_with("/a.txt"));
        assert!(server.url("a.txt").starts_with(server.base_url()));
    }
}
