//! Realtime-database client (Firebase RTDB REST surface).
//!
//! | Module   | Role                                              |
//! |----------|---------------------------------------------------|
//! | `auth`   | sign-in, refresh, token status tracking           |
//! | `http`   | blocking request/response seam                    |
//! | `client` | `PUT <db>/<path>.json?auth=<token>` string writes |
//!
//! [`RtdbClient`] implements the domain's
//! [`DatabasePort`](crate::app::ports::DatabasePort).

pub mod auth;
pub mod client;
pub mod http;

use core::fmt;

pub use auth::{SignInAccount, TokenManager, TokenStatus};
pub use client::RtdbClient;
pub use http::{HttpClient, HttpError, HttpResponse, Method};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// No valid id token is held.
    NotReady,
    /// The request never produced an HTTP response.
    Transport(HttpError),
    /// The auth endpoint rejected sign-in or refresh.
    Auth(u16),
    /// The database rejected the id token (401).
    Unauthorized,
    /// Any other non-2xx write response.
    Status(u16),
    /// Request body could not be serialized.
    Encode,
    /// Response body was not the expected JSON.
    Decode,
}

impl fmt::Display for DbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "not ready (no valid token)"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Auth(code) => write!(f, "auth rejected (HTTP {code})"),
            Self::Unauthorized => write!(f, "token rejected (HTTP 401)"),
            Self::Status(code) => write!(f, "HTTP {code}"),
            Self::Encode => write!(f, "request encoding failed"),
            Self::Decode => write!(f, "response decoding failed"),
        }
    }
}

impl std::error::Error for DbError {}

impl From<HttpError> for DbError {
    fn from(e: HttpError) -> Self {
        Self::Transport(e)
    }
}
