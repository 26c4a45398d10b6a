//! Snapshot retrieval and the best-effort diagnostic channel.

use std::time::Duration;

use embedded_svc::{
    http::client::Client,
    io::{Read, Write},
};
use esp_idf_svc::{
    http::client::{Configuration, EspHttpConnection},
    io::EspIOError,
    sys::EspError,
};
use log::{info, warn};
use thiserror::Error;

use display::snapshot::{Snapshot, SnapshotError};

/// Size cap for the snapshot body. A healthy backend response is a few
/// kilobytes; anything past this is broken and not worth allocating for.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

const HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("http transport failed: {0}")]
    Http(EspError),
    #[error("http status {0}")]
    Status(u16),
    #[error("response larger than {MAX_BODY_BYTES} bytes")]
    Oversized,
    #[error("response body is not valid utf-8")]
    Utf8,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

impl From<EspError> for FetchError {
    fn from(e: EspError) -> Self {
        FetchError::Http(e)
    }
}

impl From<EspIOError> for FetchError {
    fn from(e: EspIOError) -> Self {
        FetchError::Http(e.0)
    }
}

/// Single GET per cycle; no retry. Any failure defers to the next wake.
pub fn fetch_snapshot(url: &str) -> Result<Snapshot, FetchError> {
    let mut client = http_client()?;

    let mut response = client.get(url)?.submit()?;
    let status = response.status();
    info!("GET {url} -> {status}");
    if !(200..300).contains(&status) {
        return Err(FetchError::Status(status));
    }

    let mut body: Vec<u8> = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = response.read(&mut buf)?;
        if n == 0 {
            break;
        }
        if body.len() + n > MAX_BODY_BYTES {
            return Err(FetchError::Oversized);
        }
        body.extend_from_slice(&buf[..n]);
    }

    let body = String::from_utf8(body).map_err(|_| FetchError::Utf8)?;
    Ok(Snapshot::from_json(&body)?)
}

/// Reports a cycle failure to the logging endpoint. Failure to report is
/// only worth a warning; the device is about to sleep either way.
pub fn report_diagnostic(url: &str, message: &str) {
    if url.is_empty() {
        return;
    }
    if let Err(e) = post_plain_text(url, message) {
        warn!("Diagnostic report failed: {e}");
    }
}

fn post_plain_text(url: &str, message: &str) -> Result<(), FetchError> {
    let mut client = http_client()?;

    let headers = [("content-type", "text/plain")];
    let mut request = client.post(url, &headers)?;
    request.write_all(message.as_bytes())?;
    let response = request.submit()?;
    info!("POST {url} -> {}", response.status());
    Ok(())
}

fn http_client() -> Result<Client<EspHttpConnection>, EspError> {
    let connection = EspHttpConnection::new(&Configuration {
        timeout: Some(HTTP_TIMEOUT),
        use_global_ca_store: true,
        crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
        ..Default::default()
    })?;
    Ok(Client::wrap(connection))
}
