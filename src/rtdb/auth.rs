//! Id-token lifecycle for the realtime database.
//!
//! Email/password sign-in against the identity toolkit yields a short-lived
//! id token (sent as `?auth=` on every write) and a long-lived refresh
//! token. [`TokenManager::ensure_ready`] is the single readiness gate:
//!
//! ```text
//!  Uninitialized ─▶ Signing ─▶ Requesting ─┬─▶ Ready ─(near expiry)─▶ Refreshing ─┬─▶ Ready
//!                                          └─▶ Error                              └─▶ Error
//!  Error ─(next readiness check)─▶ Signing ...
//!  Ready ─(write got 401)─▶ Ready, rejected ─(next readiness check)─▶ Signing ...
//! ```
//!
//! Every status change is queued so the caller can report it; the queue
//! is drained with [`TokenManager::take_change`].

use core::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::http::{HttpClient, Method};
use super::DbError;

pub const SIGN_IN_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";
pub const REFRESH_URL: &str = "https://securetoken.googleapis.com/v1/token";

const STATUS_QUEUE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Uninitialized,
    Signing,
    Requesting,
    Refreshing,
    Ready,
    Error,
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Signing => write!(f, "Signing in"),
            Self::Requesting => write!(f, "Requesting token"),
            Self::Refreshing => write!(f, "Refreshing token"),
            Self::Ready => write!(f, "Ready"),
            Self::Error => write!(f, "Error"),
        }
    }
}

// ── Wire types ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    grant_type: &'a str,
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

/// Account the device signs in as.
#[derive(Clone, Copy)]
pub struct SignInAccount {
    pub api_key: &'static str,
    pub email: &'static str,
    pub password: &'static str,
}

impl fmt::Debug for SignInAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInAccount")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

// ── Token manager ─────────────────────────────────────────────

pub struct TokenManager {
    account: SignInAccount,
    status: TokenStatus,
    id_token: String,
    refresh_token: String,
    /// Uptime (ms) at which the id token expires.
    expires_at_ms: u64,
    refresh_margin_ms: u64,
    changes: heapless::Deque<TokenStatus, STATUS_QUEUE_LEN>,
    /// A write was answered with 401; sign in again at the next check.
    rejected: bool,
}

impl TokenManager {
    pub fn new(account: SignInAccount, refresh_margin_secs: u32) -> Self {
        Self {
            account,
            status: TokenStatus::Uninitialized,
            id_token: String::new(),
            refresh_token: String::new(),
            expires_at_ms: 0,
            refresh_margin_ms: u64::from(refresh_margin_secs) * 1000,
            changes: heapless::Deque::new(),
            rejected: false,
        }
    }

    pub fn status(&self) -> TokenStatus {
        self.status
    }

    /// Current id token, if one is held. A token marked rejected is still
    /// handed out until the next readiness check replaces it.
    pub fn id_token(&self) -> Option<&str> {
        (self.status == TokenStatus::Ready && !self.id_token.is_empty())
            .then_some(self.id_token.as_str())
    }

    pub fn expires_at_ms(&self) -> u64 {
        self.expires_at_ms
    }

    /// Oldest unreported status change.
    pub fn take_change(&mut self) -> Option<TokenStatus> {
        self.changes.pop_front()
    }

    /// Make sure a usable id token is held at `now_ms`, signing in or
    /// refreshing as needed. Returns `true` when ready.
    pub fn ensure_ready(&mut self, http: &mut impl HttpClient, now_ms: u64) -> bool {
        match self.status {
            TokenStatus::Ready if self.rejected => {
                if let Err(e) = self.sign_in(http, now_ms) {
                    warn!("rtdb: sign-in failed: {e}");
                    self.fail();
                }
            }
            TokenStatus::Ready if !self.needs_refresh(now_ms) => return true,
            TokenStatus::Ready => {
                if let Err(e) = self.refresh(http, now_ms) {
                    warn!("rtdb: token refresh failed: {e}");
                    self.fail();
                }
            }
            _ => {
                if let Err(e) = self.sign_in(http, now_ms) {
                    warn!("rtdb: sign-in failed: {e}");
                    self.fail();
                }
            }
        }
        self.status == TokenStatus::Ready
    }

    /// Record that the database answered 401. The token stays usable for
    /// the rest of the current cycle (a 401 may come from a rule on one
    /// path); the next readiness check signs in again.
    pub fn mark_rejected(&mut self) {
        if !self.rejected {
            info!("rtdb: id token rejected, will sign in again");
        }
        self.rejected = true;
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected
    }

    fn needs_refresh(&self, now_ms: u64) -> bool {
        now_ms.saturating_add(self.refresh_margin_ms) >= self.expires_at_ms
    }

    fn sign_in(&mut self, http: &mut impl HttpClient, now_ms: u64) -> Result<(), DbError> {
        self.set_status(TokenStatus::Signing);
        let body = serde_json::to_vec(&SignInRequest {
            email: self.account.email,
            password: self.account.password,
            return_secure_token: true,
        })
        .map_err(|_| DbError::Encode)?;

        self.set_status(TokenStatus::Requesting);
        let url = format!("{SIGN_IN_URL}?key={}", self.account.api_key);
        let resp = http.request(Method::Post, &url, &body)?;
        if !resp.is_success() {
            return Err(DbError::Auth(resp.status));
        }
        let parsed: SignInResponse =
            serde_json::from_slice(&resp.body).map_err(|_| DbError::Decode)?;
        let lifetime_secs = parse_expires_in(&parsed.expires_in)?;

        self.accept(parsed.id_token, parsed.refresh_token, now_ms, lifetime_secs);
        info!("rtdb: signed in as {}", self.account.email);
        Ok(())
    }

    fn refresh(&mut self, http: &mut impl HttpClient, now_ms: u64) -> Result<(), DbError> {
        self.set_status(TokenStatus::Refreshing);
        let body = serde_json::to_vec(&RefreshRequest {
            grant_type: "refresh_token",
            refresh_token: &self.refresh_token,
        })
        .map_err(|_| DbError::Encode)?;

        let url = format!("{REFRESH_URL}?key={}", self.account.api_key);
        let resp = http.request(Method::Post, &url, &body)?;
        if !resp.is_success() {
            return Err(DbError::Auth(resp.status));
        }
        let parsed: RefreshResponse =
            serde_json::from_slice(&resp.body).map_err(|_| DbError::Decode)?;
        let lifetime_secs = parse_expires_in(&parsed.expires_in)?;

        self.accept(parsed.id_token, parsed.refresh_token, now_ms, lifetime_secs);
        debug!("rtdb: token refreshed, valid for {lifetime_secs} s");
        Ok(())
    }

    fn accept(&mut self, id_token: String, refresh_token: String, now_ms: u64, lifetime_secs: u64) {
        self.id_token = id_token;
        self.refresh_token = refresh_token;
        self.expires_at_ms = now_ms.saturating_add(lifetime_secs.saturating_mul(1000));
        self.rejected = false;
        self.set_status(TokenStatus::Ready);
    }

    fn fail(&mut self) {
        self.id_token.clear();
        self.expires_at_ms = 0;
        self.rejected = false;
        self.set_status(TokenStatus::Error);
    }

    fn set_status(&mut self, status: TokenStatus) {
        if status == self.status {
            return;
        }
        self.status = status;
        if self.changes.is_full() {
            self.changes.pop_front();
        }
        // Cannot fail: a slot was freed above.
        let _ = self.changes.push_back(status);
    }
}

/// `expiresIn` is a decimal string of seconds ("3600").
fn parse_expires_in(s: &str) -> Result<u64, DbError> {
    s.trim().parse().map_err(|_| DbError::Decode)
}
