//! Integration tests for the uio binary and its exit codes

use assert_cmd::Command;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use predicates::prelude::*;
use std::fs;
use uio_testing::{fixtures, TestDir, TestHttpServer};

fn uio() -> Command {
    Command::cargo_bin("uio").unwrap()
}

#[test]
fn test_logs_every_line() {
    let temp_dir = TestDir::new().unwrap();
    let path = temp_dir.create_file("lines.txt", b"alpha\nbeta\n").unwrap();

    uio()
        .arg(&path)
        .assert()
        .success()
        .code(0)
        .stderr(predicate::str::contains("Read line: alpha"))
        .stderr(predicate::str::contains("Read line: beta"));
}

#[test]
fn test_reads_gzip_file() {
    let temp_dir = TestDir::new().unwrap();
    temp_dir
        .create_file("hello.txt.gz", &fixtures::gzip(fixtures::HELLO_WORLD))
        .unwrap();

    uio()
        .arg(temp_dir.file_uri("hello.txt.gz"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Read line: Hello World!"));
}

#[test]
fn test_reads_stdin() {
    uio()
        .arg("-")
        .write_stdin("from stdin\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Read line: from stdin"));
}

#[test]
fn test_quiet_suppresses_logs() {
    let temp_dir = TestDir::new().unwrap();
    let path = temp_dir.create_file("q.txt", b"hidden\n").unwrap();

    uio()
        .arg("--quiet")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_echo_appends_lines() {
    let temp_dir = TestDir::new().unwrap();
    temp_dir.create_file("echo.txt", b"a\nb\n").unwrap();

    uio()
        .arg(format!("{}?mode=append", temp_dir.file_uri("echo.txt")))
        .arg("--echo")
        .assert()
        .success()
        .stderr(predicate::str::contains("Write line: b"));

    assert_eq!(
        fs::read_to_string(temp_dir.join("echo.txt")).unwrap(),
        "a\nb\na\nb\n"
    );
}

#[test]
fn test_echo_on_read_only_handle_fails() {
    let temp_dir = TestDir::new().unwrap();
    temp_dir
        .create_file("ro.gz", &fixtures::gzip(b"line\n"))
        .unwrap();

    uio()
        .arg(temp_dir.file_uri("ro.gz"))
        .arg("--echo")
        .assert()
        .failure()
        .code(3);
}

#[test]
fn test_output_copies_into_gzip() {
    let temp_dir = TestDir::new().unwrap();
    let text = fixtures::sample_lines(20);
    let input = temp_dir.create_file("in.txt", text.as_bytes()).unwrap();

    uio()
        .arg(&input)
        .arg("--output")
        .arg(temp_dir.file_uri("out.txt.gz"))
        .assert()
        .success();

    let stored = fs::read(temp_dir.join("out.txt.gz")).unwrap();
    assert_eq!(fixtures::gunzip(&stored), text.as_bytes());
}

#[test]
fn test_output_to_stdout() {
    let temp_dir = TestDir::new().unwrap();
    let input = temp_dir.create_file("in.txt", fixtures::HELLO_WORLD).unwrap();

    uio()
        .arg("--quiet")
        .arg(&input)
        .arg("--output")
        .arg("-")
        .assert()
        .success()
        .stdout(predicate::eq(&b"Hello World!"[..]));
}

#[test]
fn test_missing_file_exit_code() {
    let temp_dir = TestDir::new().unwrap();

    uio()
        .arg(temp_dir.file_uri("missing.txt"))
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_invalid_mode_exit_code() {
    let temp_dir = TestDir::new().unwrap();
    let path = temp_dir.create_file("m.txt", b"x").unwrap();

    uio()
        .arg(format!("{}?mode=truncate", path.display()))
        .assert()
        .failure()
        .code(3);
}

#[test]
fn test_http_status_exit_code() {
    let server = TestHttpServer::start(Router::new().route(
        "/down",
        get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    ))
    .unwrap();

    uio()
        .arg(server.url("/missing.txt"))
        .assert()
        .failure()
        .code(4);

    uio()
        .arg(server.url("/down"))
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("503"));
}

#[test]
fn test_http_read() {
    let server = TestHttpServer::start(
        Router::new().route("/hello.txt", get(|| async { "Hello World!\n" })),
    )
    .unwrap();

    uio()
        .arg(server.url("/hello.txt"))
        .assert()
        .success()
        .stderr(predicate::str::contains("Read line: Hello World!"));
}

#[test]
fn test_config_file_is_used() {
    let temp_dir = TestDir::new().unwrap();
    let config = temp_dir
        .create_file("config.toml", b"[http]\ntimeout_secs = \"never\"\n")
        .unwrap();
    let input = temp_dir.create_file("in.txt", b"x\n").unwrap();

    // A broken configuration file is a general error
    uio()
        .arg("--config")
        .arg(&config)
        .arg(&input)
        .assert()
        .failure()
        .code(1);
}
