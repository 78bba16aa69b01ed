//! Bearer credential and its lock-protected store

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Short-lived bearer token with its absolute expiry
///
/// An empty token means the credential was never fetched.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Credential that has never been fetched
    pub fn empty() -> Self {
        Self { token: String::new(), expires_at: DateTime::<Utc>::MIN_UTC }
    }

    pub fn new(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self { token: token.into(), expires_at }
    }

    /// Credential expiring `expires_in_secs` seconds after `now`
    pub fn issued_at(token: impl Into<String>, now: DateTime<Utc>, expires_in_secs: i64) -> Self {
        let expires_at = now
            .checked_add_signed(chrono::Duration::seconds(expires_in_secs))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self::new(token, expires_at)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_empty(&self) -> bool {
        self.token.is_empty()
    }

    /// Usable iff non-empty and `expires_at - now > skew`
    ///
    /// A credential exactly `skew` away from expiry is not usable.
    pub fn is_usable(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        if self.is_empty() {
            return false;
        }
        let skew = chrono::Duration::from_std(skew).unwrap_or(chrono::Duration::MAX);
        match self.expires_at.signed_duration_since(now).checked_sub(&skew) {
            Some(margin) => margin > chrono::Duration::zero(),
            None => false,
        }
    }
}

impl Default for Credential {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &if self.is_empty() { "<empty>" } else { "<redacted>" })
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Thread-safe holder of the current [`Credential`]
///
/// The lock is only ever held for a read-check or a wholesale replace, never
/// across a network call.
#[derive(Debug, Default)]
pub struct CredentialStore {
    current: Mutex<Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self { current: Mutex::new(Credential::empty()) }
    }

    /// Copy of the current credential
    pub fn snapshot(&self) -> Credential {
        self.current.lock().clone()
    }

    pub fn is_usable(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        self.current.lock().is_usable(now, skew)
    }

    /// Copy of the current credential if it passes the usability check,
    /// taken under the same lock as the check
    pub fn usable(&self, now: DateTime<Utc>, skew: Duration) -> Option<Credential> {
        let current = self.current.lock();
        current.is_usable(now, skew).then(|| current.clone())
    }

    /// Replace token and expiry in one step
    pub fn install(&self, credential: Credential) {
        *self.current.lock() = credential;
    }

    /// Forget the current credential
    pub fn clear(&self) {
        self.install(Credential::empty());
    }
}
