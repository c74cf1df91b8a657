//! Minimal blocking HTTP seam for the database client.
//!
//! The client only ever sends a JSON body and reads back a bounded JSON
//! body, so the trait is one call. The ESP-IDF implementation lives in
//! `adapters::http_client`; tests script responses.

use core::fmt;

/// Largest response body the client will buffer. A sign-in response with
/// both tokens is well under 2 KiB.
pub const MAX_RESPONSE_BYTES: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    /// Connection or TLS setup failed (ESP error code).
    Connect(i32),
    /// Sending the request or reading the response failed.
    Io(i32),
    /// Response body exceeded [`MAX_RESPONSE_BYTES`].
    ResponseTooLarge,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect(rc) => write!(f, "connect failed (rc={rc})"),
            Self::Io(rc) => write!(f, "I/O failed (rc={rc})"),
            Self::ResponseTooLarge => write!(f, "response exceeds {MAX_RESPONSE_BYTES} bytes"),
        }
    }
}

/// One request, one response. The body is sent as `application/json`.
pub trait HttpClient {
    fn request(&mut self, method: Method, url: &str, body: &[u8]) -> Result<HttpResponse, HttpError>;
}
