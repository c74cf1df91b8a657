//! ESP-IDF HTTPS client adapter.
//!
//! Implements [`HttpClient`] over `EspHttpConnection`. Server certificates
//! are verified against the ESP-IDF certificate bundle. A fresh connection
//! is opened per request: the database and the two auth endpoints are
//! different hosts, and a failed request never leaves a half-read
//! connection behind.

use std::time::Duration;

use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
use esp_idf_svc::http::Method as EspMethod;
use log::debug;

use crate::rtdb::http::{HttpClient, HttpError, HttpResponse, Method, MAX_RESPONSE_BYTES};

/// Room for a request line carrying a ~1 KiB id token in the query.
const TX_BUFFER_BYTES: usize = 2048;
const RX_BUFFER_BYTES: usize = 2048;
const READ_CHUNK_BYTES: usize = 512;

pub struct EspHttpClient {
    timeout: Duration,
}

impl EspHttpClient {
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            timeout: Duration::from_millis(u64::from(timeout_ms)),
        }
    }

    fn open(&self) -> Result<EspHttpConnection, HttpError> {
        EspHttpConnection::new(&Configuration {
            timeout: Some(self.timeout),
            buffer_size: Some(RX_BUFFER_BYTES),
            buffer_size_tx: Some(TX_BUFFER_BYTES),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(|e| HttpError::Connect(e.code()))
    }
}

impl HttpClient for EspHttpClient {
    fn request(&mut self, method: Method, url: &str, body: &[u8]) -> Result<HttpResponse, HttpError> {
        let mut conn = self.open()?;

        let esp_method = match method {
            Method::Post => EspMethod::Post,
            Method::Put => EspMethod::Put,
        };
        let content_length = body.len().to_string();
        let headers = [
            ("content-type", "application/json"),
            ("content-length", content_length.as_str()),
        ];
        conn.initiate_request(esp_method, url, &headers)
            .map_err(|e| HttpError::Connect(e.code()))?;

        let mut sent = 0;
        while sent < body.len() {
            let n = conn.write(&body[sent..]).map_err(|e| HttpError::Io(e.code()))?;
            if n == 0 {
                return Err(HttpError::Io(-1));
            }
            sent += n;
        }

        conn.initiate_response().map_err(|e| HttpError::Io(e.code()))?;
        let status = conn.status();

        let mut response = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_BYTES];
        loop {
            let n = conn.read(&mut chunk).map_err(|e| HttpError::Io(e.code()))?;
            if n == 0 {
                break;
            }
            if response.len() + n > MAX_RESPONSE_BYTES {
                return Err(HttpError::ResponseTooLarge);
            }
            response.extend_from_slice(&chunk[..n]);
        }

        debug!("http: {method} -> {status} ({} bytes)", response.len());
        Ok(HttpResponse {
            status,
            body: response,
        })
    }
}
