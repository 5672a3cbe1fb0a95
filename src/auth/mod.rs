//! Sessions: the encrypted session and currency cookies and the middleware
//! that protects routes which need a logged in user.

mod cookie;
mod middleware;
mod token;

pub use cookie::DEFAULT_COOKIE_DURATION;
pub(crate) use cookie::{
    get_currency_from_cookies, get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie,
    set_currency_cookie,
};
pub use middleware::{AuthState, auth_guard};

#[cfg(test)]
pub(crate) use cookie::{COOKIE_CURRENCY, COOKIE_SESSION};
