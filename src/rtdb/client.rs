//! String writes to the realtime database over REST.

use log::{debug, warn};

use super::auth::{SignInAccount, TokenManager, TokenStatus};
use super::http::{HttpClient, Method};
use super::DbError;
use crate::app::ports::DatabasePort;

pub struct RtdbClient<H> {
    http: H,
    auth: TokenManager,
    /// Database URL without a trailing slash.
    base_url: String,
}

impl<H: HttpClient> RtdbClient<H> {
    pub fn new(http: H, database_url: &str, account: SignInAccount, refresh_margin_secs: u32) -> Self {
        Self {
            http,
            auth: TokenManager::new(account, refresh_margin_secs),
            base_url: database_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn token_status(&self) -> TokenStatus {
        self.auth.status()
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn http_mut(&mut self) -> &mut H {
        &mut self.http
    }

    /// `PUT <db><path>.json?auth=<token>`, body is the JSON string `value`.
    pub fn put_string(&mut self, path: &str, value: &str) -> Result<(), DbError> {
        let token = self.auth.id_token().ok_or(DbError::NotReady)?;
        let url = write_url(&self.base_url, path, token);
        let body = serde_json::to_vec(value).map_err(|_| DbError::Encode)?;

        let resp = self.http.request(Method::Put, &url, &body)?;
        debug!("rtdb: PUT {path} -> {}", resp.status);
        match resp.status {
            s if (200..300).contains(&s) => Ok(()),
            401 => {
                self.auth.mark_rejected();
                Err(DbError::Unauthorized)
            }
            s => {
                warn!("rtdb: PUT {path} rejected: {}", String::from_utf8_lossy(&resp.body));
                Err(DbError::Status(s))
            }
        }
    }
}

impl<H: HttpClient> DatabasePort for RtdbClient<H> {
    fn ready(&mut self, now_ms: u64) -> bool {
        self.auth.ensure_ready(&mut self.http, now_ms)
    }

    fn set_string(&mut self, path: &str, value: &str) -> Result<(), DbError> {
        self.put_string(path, value)
    }

    fn poll_status_change(&mut self) -> Option<TokenStatus> {
        self.auth.take_change()
    }
}

/// Join base URL and an absolute node path into a REST write URL.
pub fn write_url(base_url: &str, path: &str, token: &str) -> String {
    let path = path.trim_start_matches('/');
    format!("{base_url}/{path}.json?auth={token}")
}
