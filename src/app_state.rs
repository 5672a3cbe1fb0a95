//! Implements a struct that holds the state of the web server.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    PasswordHash, RateTable,
    auth::DEFAULT_COOKIE_DURATION,
    stores::{LedgerStore, UserStore},
};

/// The state of the web server.
#[derive(Clone)]
pub struct AppState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,

    /// Whether cookies are marked `Secure`, which browsers only send over HTTPS.
    pub secure_cookies: bool,

    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,

    /// The exchange rates used to convert amounts for display and entry.
    pub rates: RateTable,

    /// Where user accounts are kept.
    pub user_store: Arc<dyn UserStore>,

    /// Where transactions are kept.
    pub ledger_store: Arc<dyn LedgerStore>,

    /// The bcrypt cost used when hashing the passwords of new users.
    pub hash_cost: u32,
}

impl AppState {
    /// Create a new [AppState].
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Asia/Kolkata".
    pub fn new(
        cookie_secret: &str,
        local_timezone: &str,
        rates: RateTable,
        user_store: Arc<dyn UserStore>,
        ledger_store: Arc<dyn LedgerStore>,
    ) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            secure_cookies: true,
            local_timezone: local_timezone.to_owned(),
            rates,
            user_store,
            ledger_store,
            hash_cost: PasswordHash::DEFAULT_COST,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cookie_duration", &self.cookie_duration)
            .field("secure_cookies", &self.secure_cookies)
            .field("local_timezone", &self.local_timezone)
            .field("rates", &self.rates)
            .field("hash_cost", &self.hash_cost)
            .finish_non_exhaustive()
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret`s string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
