use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use std::io::{self, Read, Write};
use std::time::{Duration, Instant};
use uio_core::{open, Error, Handle, Opener, UioConfig};
use uio_testing::{fixtures, TestHttpServer};

fn server() -> TestHttpServer {
    let compressed = fixtures::gzip(fixtures::HELLO_WORLD);
    let router = Router::new()
        .route("/hello.txt", get(|| async { fixtures::HELLO_WORLD }))
        .route(
            "/hello.txt.gz",
            get(move || {
                let body = compressed.clone();
                async move { body }
            }),
        )
        .route("/fake.gz", get(|| async { "not gzip at all" }))
        .route(
            "/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
    TestHttpServer::start(router).unwrap()
}

fn read_all(mut handle: Handle) -> Vec<u8> {
    let mut buffer = Vec::new();
    handle.read_to_end(&mut buffer).unwrap();
    handle.close().unwrap();
    buffer
}

#[test]
fn test_http_read() {
    let server = server();
    let handle = open(&server.url("/hello.txt")).unwrap();
    assert!(matches!(handle, Handle::ReadOnly(_)));
    assert_eq!(read_all(handle), fixtures::HELLO_WORLD);
}

#[test]
fn test_http_gzip_body_is_decoded() {
    let server = server();
    let handle = open(&server.url("/hello.txt.gz")).unwrap();
    assert_eq!(read_all(handle), fixtures::HELLO_WORLD);
}

#[test]
fn test_http_not_found() {
    let server = server();
    let err = open(&server.url("/missing")).unwrap_err();
    match err {
        Error::RemoteStatus { status, ref reason } => {
            assert_eq!(status, 404);
            assert_eq!(reason, "Not Found");
        }
        other => panic!("expected RemoteStatus, got {:?}", other),
    }
}

#[test]
fn test_http_server_error() {
    let server = server();
    let err = open(&server.url("/broken")).unwrap_err();
    assert!(matches!(err, Error::RemoteStatus { status: 500, .. }));
    assert!(err.to_string().contains("500 Internal Server Error"));
}

#[test]
fn test_http_corrupt_gzip() {
    let server = server();
    let err = open(&server.url("/fake.gz")).unwrap_err();
    assert!(matches!(err, Error::CompressionFormat(_)));
}

#[test]
fn test_http_rejects_writes() {
    let server = server();
    let mut handle = open(&server.url("/hello.txt")).unwrap();
    let err = handle.write(b"upload").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Unsupported);
}

#[test]
fn test_http_connection_refused() {
    // Bind and drop a server to get a port nobody listens on
    let url = {
        let server = TestHttpServer::start(Router::new()).unwrap();
        server.url("/gone.txt")
    };
    let err = open(&url).unwrap_err();
    assert!(matches!(err, Error::Http { .. }));
}

#[test]
fn test_http_request_timeout() {
    let server = TestHttpServer::start(Router::new().route(
        "/slow.txt",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            "too late"
        }),
    ))
    .unwrap();

    let mut config = UioConfig::default();
    config.http.timeout_secs = 1;
    let opener = Opener::with_config(config).unwrap();

    let started = Instant::now();
    let err = opener.open(&server.url("/slow.txt")).unwrap_err();
    let elapsed = started.elapsed();

    match err {
        Error::Http { ref source, .. } => assert!(source.is_timeout()),
        other => panic!("expected Http, got {:?}", other),
    }
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
}
