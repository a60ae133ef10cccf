//! uio-cli - Command-line interface for uio
//!
//! Opens one resource by URI and either logs its lines, echoes them back
//! through the same handle, or copies its bytes into another URI.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use uio_cloud::CloudError;
use uio_core::{AccessMode, Handle, Opener, UioConfig};

/// uio - one interface for files, HTTP(S) URLs and S3 objects
#[derive(Parser)]
#[command(name = "uio")]
#[command(author, version, about = "Read and write files, HTTP(S) URLs and S3 objects by URI", long_about = None)]
struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Configuration file (defaults to <config dir>/uio/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resource to open: a path, `-` for stdin, or a file://, http(s):// or s3:// URI
    uri: String,

    /// Write every line back through the same handle
    #[arg(long, conflicts_with = "output")]
    echo: bool,

    /// Copy all bytes into this URI (opened for writing unless it sets `mode`)
    #[arg(short, long)]
    output: Option<String>,
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let result = run();

    match result {
        Ok(_) => process::exit(0),
        Err(e) => {
            error!("Error: {:#}", e);

            let exit_code = map_error_to_exit_code(&e);
            process::exit(exit_code);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => UioConfig::load_from(path)?,
        None => UioConfig::load()?,
    };
    debug!("Using configuration: {:?}", config);

    let opener = Opener::with_config(config)?;
    let input = opener
        .open(&cli.uri)
        .context("Failed to open resource")?;

    match &cli.output {
        Some(output) => {
            let bytes = copy_into(&opener, input, output)?;
            info!("Copied {} bytes", bytes);
        }
        None => {
            let lines = scan_lines(input, cli.echo)?;
            info!("Read {} lines", lines);
        }
    }

    Ok(())
}

/// Log every line of `handle`, optionally writing each one back
fn scan_lines(handle: Handle, echo: bool) -> Result<u64> {
    let mut reader = BufReader::new(handle);
    let mut buffer = Vec::new();
    let mut lines = 0;

    loop {
        buffer.clear();
        let n = reader
            .read_until(b'\n', &mut buffer)
            .context("Failed to read resource")?;
        if n == 0 {
            break;
        }
        lines += 1;

        let line = String::from_utf8_lossy(trim_line_ending(&buffer)).into_owned();
        info!("Read line: {}", line);

        if echo {
            let handle = reader.get_mut();
            handle
                .write_all(line.as_bytes())
                .and_then(|_| handle.write_all(b"\n"))
                .context("Failed to write line back")?;
            info!("Write line: {}", line);
        }
    }

    reader
        .into_inner()
        .close()
        .context("Failed to close resource")?;
    Ok(lines)
}

/// Stream all bytes of `input` into `output_uri`, then close both
fn copy_into(opener: &Opener, mut input: Handle, output_uri: &str) -> Result<u64> {
    let mut output = opener
        .open_with_mode(output_uri, AccessMode::Write)
        .context("Failed to open output")?;

    let bytes = io::copy(&mut input, &mut output).context("Failed to copy resource")?;

    input.close().context("Failed to close resource")?;
    output.close().context("Failed to close output")?;
    Ok(bytes)
}

fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(uio_err) = cause.downcast_ref::<uio_core::Error>() {
            return core_exit_code(uio_err);
        }
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            // Handle I/O wraps the library error it came from
            if let Some(uio_err) = io_err
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<uio_core::Error>())
            {
                return core_exit_code(uio_err);
            }
            if let Some(cloud_err) = io_err
                .get_ref()
                .and_then(|inner| inner.downcast_ref::<CloudError>())
            {
                return cloud_exit_code(cloud_err);
            }
            return match io_err.kind() {
                io::ErrorKind::Unsupported => 3,
                _ => 2,
            };
        }
    }
    1
}

fn core_exit_code(err: &uio_core::Error) -> i32 {
    match err {
        uio_core::Error::Io(_) => 2,
        uio_core::Error::Open { .. } => 2,
        uio_core::Error::Http { .. } => 2,
        uio_core::Error::InvalidUri { .. } => 3,
        uio_core::Error::InvalidMode(_) => 3,
        uio_core::Error::UnsupportedOperation(_) => 3,
        uio_core::Error::RemoteStatus { .. } => 4,
        uio_core::Error::CompressionFormat(_) => 4,
        uio_core::Error::Cloud(cloud_err) => cloud_exit_code(cloud_err),
        uio_core::Error::Config(_) => 1,
    }
}

fn cloud_exit_code(err: &CloudError) -> i32 {
    match err {
        CloudError::ObjectStore(_) => 2,
        CloudError::Connect { .. } => 2,
        CloudError::Io(_) => 2,
        CloudError::InvalidLocation(_) => 3,
        CloudError::UploadFailed { .. } => 4,
        CloudError::Config(_) => 1,
        CloudError::Runtime(_) => 1,
        CloudError::Closed => 1,
    }
}
