use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use uio_core::{open, AccessMode, Error, Handle, Opener};
use uio_testing::{fixtures, TestDir};
use uuid::Uuid;

fn read_all(uri: &str) -> Vec<u8> {
    let mut handle = open(uri).unwrap();
    let mut buffer = Vec::new();
    handle.read_to_end(&mut buffer).unwrap();
    handle.close().unwrap();
    buffer
}

#[test]
fn test_write_then_read_hello_world() {
    let temp_dir = TestDir::new().unwrap();
    let uri = temp_dir.file_uri("x.txt");

    let mut handle = open(&format!("{}?mode=write", uri)).unwrap();
    assert!(matches!(handle, Handle::Direct(_)));
    handle.write_all(fixtures::HELLO_WORLD).unwrap();
    handle.close().unwrap();

    let content = read_all(&uri);
    assert_eq!(content.len(), 12);
    assert_eq!(content, b"Hello World!");
}

#[test]
fn test_gzip_round_trip() {
    let temp_dir = TestDir::new().unwrap();
    let uri = temp_dir.file_uri("lines.txt.gz");
    let text = fixtures::sample_lines(100);

    let mut handle = open(&format!("{}?mode=write", uri)).unwrap();
    assert!(matches!(handle, Handle::WriteOnly(_)));
    handle.write_all(text.as_bytes()).unwrap();
    handle.close().unwrap();

    // Stored compressed, read back decompressed
    let stored = fs::read(temp_dir.join("lines.txt.gz")).unwrap();
    assert_eq!(fixtures::gunzip(&stored), text.as_bytes());
    assert_eq!(read_all(&uri), text.as_bytes());
}

#[test]
fn test_gzip_suffix_variant() {
    let temp_dir = TestDir::new().unwrap();
    temp_dir
        .create_file("data.gzip", &fixtures::gzip(fixtures::HELLO_WORLD))
        .unwrap();

    assert_eq!(read_all(&temp_dir.file_uri("data.gzip")), fixtures::HELLO_WORLD);
}

#[test]
fn test_gzip_append_adds_member() {
    let temp_dir = TestDir::new().unwrap();
    let uri = temp_dir.file_uri("log.gz");

    for line in ["first\n", "second\n"] {
        let mut handle = open(&format!("{}?mode=append", uri)).unwrap();
        handle.write_all(line.as_bytes()).unwrap();
        handle.close().unwrap();
    }

    assert_eq!(read_all(&uri), b"first\nsecond\n");
}

#[test]
fn test_corrupt_gzip_fails_at_open() {
    let temp_dir = TestDir::new().unwrap();
    temp_dir.create_file("fake.gz", b"plain text, not gzip").unwrap();

    let err = open(&temp_dir.file_uri("fake.gz")).unwrap_err();
    assert!(matches!(err, Error::CompressionFormat(_)));
}

#[test]
fn test_read_only_gzip_rejects_writes() {
    let temp_dir = TestDir::new().unwrap();
    temp_dir
        .create_file("r.gz", &fixtures::gzip(b"abc"))
        .unwrap();

    let mut handle = open(&temp_dir.file_uri("r.gz")).unwrap();
    let err = handle.write(b"x").unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Unsupported);
}

#[test]
fn test_bare_path_uses_path_verbatim() {
    let temp_dir = TestDir::new().unwrap();
    let path = temp_dir.create_file("bare.txt", b"bare content").unwrap();

    assert_eq!(read_all(&path.display().to_string()), b"bare content");
}

/// Directory relative to the working directory, removed on drop
struct RelativeDir(PathBuf);

impl Drop for RelativeDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

#[test]
fn test_unknown_scheme_falls_back_to_file() {
    // ftp://host/path.txt resolves to the relative path host/path.txt
    let host = format!("uio-test-{}", Uuid::new_v4().simple());
    let dir = RelativeDir(PathBuf::from(&host));
    fs::create_dir_all(&dir.0).unwrap();
    fs::write(dir.0.join("path.txt"), b"via ftp").unwrap();

    assert_eq!(read_all(&format!("ftp://{}/path.txt", host)), b"via ftp");
}

#[test]
fn test_unknown_scheme_missing_file() {
    let err = open("ftp://host/path").unwrap_err();
    assert!(matches!(err, Error::Open { .. }));
    assert!(err.is_not_found());
}

#[test]
fn test_missing_file() {
    let temp_dir = TestDir::new().unwrap();
    let err = open(&temp_dir.file_uri("absent.txt")).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_invalid_mode() {
    let temp_dir = TestDir::new().unwrap();
    let err = open(&format!("{}?mode=overwrite", temp_dir.file_uri("m.txt"))).unwrap_err();
    assert!(matches!(err, Error::InvalidMode(ref mode) if mode == "overwrite"));
    assert!(!temp_dir.join("m.txt").exists());
}

#[test]
fn test_default_mode_and_explicit_override() {
    let temp_dir = TestDir::new().unwrap();
    let opener = Opener::new().unwrap();
    let uri = temp_dir.file_uri("out.txt");

    let mut handle = opener.open_with_mode(&uri, AccessMode::Write).unwrap();
    handle.write_all(b"one").unwrap();
    handle.close().unwrap();

    // An explicit mode wins over the default
    let mut handle = opener
        .open_with_mode(&format!("{}?mode=append", uri), AccessMode::Write)
        .unwrap();
    handle.write_all(b"two").unwrap();
    handle.close().unwrap();

    assert_eq!(fs::read(temp_dir.join("out.txt")).unwrap(), b"onetwo");
}

#[test]
fn test_invalid_uri() {
    let err = open("http://[::1/x").unwrap_err();
    assert!(matches!(err, Error::InvalidUri { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_file_open_inside_async_runtime() {
    let temp_dir = TestDir::new().unwrap();
    let path = temp_dir.create_file("async.txt", fixtures::HELLO_WORLD).unwrap();
    let path = path.to_str().unwrap();

    assert_eq!(read_all(path), fixtures::HELLO_WORLD);

    // A dedicated opener that only touched files holds no runtime to drop
    let opener = Opener::new().unwrap();
    let mut handle = opener.open(path).unwrap();
    let mut buffer = Vec::new();
    handle.read_to_end(&mut buffer).unwrap();
    handle.close().unwrap();
    drop(opener);
    assert_eq!(buffer, fixtures::HELLO_WORLD);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut config = uio_core::UioConfig::default();
    config.upload.max_attempts = 0;
    assert!(matches!(Opener::with_config(config), Err(Error::Config(_))));
}
