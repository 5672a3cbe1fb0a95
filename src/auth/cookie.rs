//! Defines functions for handling the session and currency cookies.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::{Currency, Error, Username, auth::token::Token};

/// The name of the cookie holding the session [Token].
pub(crate) const COOKIE_SESSION: &str = "session";
/// The name of the cookie holding the display currency.
pub(crate) const COOKIE_CURRENCY: &str = "currency";
/// The default duration for which session cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

/// `secure` marks the cookie as HTTPS only and should match whether the
/// server is behind TLS.
fn build_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .build()
}

fn set_token_cookie(
    jar: PrivateCookieJar,
    token: &Token,
    secure: bool,
) -> Result<PrivateCookieJar, Error> {
    let token_string = serde_json::to_string(token)
        .map_err(|error| Error::JSONSerializationError(error.to_string()))?;

    let mut cookie = build_cookie(COOKIE_SESSION, token_string, secure);
    cookie.set_expires(token.expires_at);

    Ok(jar.add(cookie))
}

/// Add a session cookie to the cookie jar, indicating that `username` is logged in.
///
/// The session expires `duration` from now. You can use
/// [DEFAULT_COOKIE_DURATION] for the default duration.
///
/// # Errors
///
/// Returns an [Error::JSONSerializationError] if the token could not be serialized.
pub(crate) fn set_auth_cookie(
    jar: PrivateCookieJar,
    username: &Username,
    duration: Duration,
    secure: bool,
) -> Result<PrivateCookieJar, Error> {
    let token = Token {
        username: username.clone(),
        expires_at: OffsetDateTime::now_utc() + duration,
    };

    set_token_cookie(jar, &token, secure)
}

/// Set the session and currency cookies to invalid values and set their max
/// age to zero, which should delete the cookies on the client side.
pub(crate) fn invalidate_auth_cookie(jar: PrivateCookieJar, secure: bool) -> PrivateCookieJar {
    [COOKIE_SESSION, COOKIE_CURRENCY]
        .into_iter()
        .fold(jar, |jar, name| {
            let mut cookie = build_cookie(name, "deleted".to_owned(), secure);
            cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
            cookie.set_max_age(Duration::ZERO);

            jar.add(cookie)
        })
}

/// Read and check the session token in `jar`.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if there is no session cookie.
/// - [Error::InvalidSessionCookie] if the cookie could not be parsed or the session has expired.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, Error> {
    let cookie = jar.get(COOKIE_SESSION).ok_or(Error::CookieMissing)?;

    let token: Token = serde_json::from_str(cookie.value_trimmed())
        .map_err(|error| Error::InvalidSessionCookie(error.to_string()))?;

    if token.is_expired(OffsetDateTime::now_utc()) {
        return Err(Error::InvalidSessionCookie("the session has expired".to_owned()));
    }

    Ok(token)
}

/// Set the expiry of the session in `jar` to the latest of UTC now
/// plus `duration` and the current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns the errors of [get_token_from_cookies], or an
/// [Error::InvalidSessionCookie] if the new expiry would overflow.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
    secure: bool,
) -> Result<PrivateCookieJar, Error> {
    let mut token = get_token_from_cookies(&jar)?;

    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or_else(|| Error::InvalidSessionCookie("the expiry overflowed".to_owned()))?;
    token.expires_at = max(token.expires_at, new_expiry);

    set_token_cookie(jar, &token, secure)
}

/// Get the display currency from `jar`, defaulting to USD.
pub(crate) fn get_currency_from_cookies(jar: &PrivateCookieJar) -> Currency {
    jar.get(COOKIE_CURRENCY)
        .and_then(|cookie| cookie.value_trimmed().parse().ok())
        .unwrap_or_default()
}

/// Remember `currency` as the display currency for this browser session.
pub(crate) fn set_currency_cookie(
    jar: PrivateCookieJar,
    currency: Currency,
    secure: bool,
) -> PrivateCookieJar {
    jar.add(build_cookie(COOKIE_CURRENCY, currency.code().to_owned(), secure))
}
