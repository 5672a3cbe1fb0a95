//! Log-out route handler that invalidates the session cookies and redirects users.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    auth::{AuthState, invalidate_auth_cookie},
    endpoints,
};

/// Invalidate the session and currency cookies and redirect the client to the log in page.
pub async fn get_log_out(State(state): State<AuthState>, jar: PrivateCookieJar) -> Response {
    let jar = invalidate_auth_cookie(jar, state.secure_cookies);

    (jar, Redirect::to(endpoints::ROOT)).into_response()
}

#[cfg(test)]
mod log_out_tests {
    use axum::{
        body::Body,
        extract::State,
        http::{Response, StatusCode, header::SET_COOKIE},
    };
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime};

    use crate::{
        Currency, Username,
        auth::{
            AuthState, COOKIE_CURRENCY, COOKIE_SESSION, DEFAULT_COOKIE_DURATION, set_auth_cookie,
            set_currency_cookie,
        },
        endpoints,
        log_out::get_log_out,
    };

    #[tokio::test]
    async fn log_out_invalidates_cookies_and_redirects() {
        let cookie_jar = set_auth_cookie(
            get_jar(),
            &Username::new_unchecked("asha"),
            DEFAULT_COOKIE_DURATION,
            true,
        )
        .unwrap();
        let cookie_jar = set_currency_cookie(cookie_jar, Currency::Inr, true);
        let state = AuthState {
            cookie_key: get_key(),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            secure_cookies: true,
        };

        let response = get_log_out(State(state), cookie_jar).await;

        assert_redirect(&response, endpoints::ROOT);
        assert_cookies_expired(&response);
    }

    fn get_key() -> Key {
        Key::from(&Sha512::digest("42"))
    }

    fn get_jar() -> PrivateCookieJar {
        PrivateCookieJar::new(get_key())
    }

    #[track_caller]
    fn assert_redirect(response: &Response<Body>, want_location: &str) {
        let redirect_location = response.headers().get("location").unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect_location, want_location);
    }

    #[track_caller]
    fn assert_cookies_expired(response: &Response<Body>) {
        let mut expired = Vec::new();

        for cookie_header in response.headers().get_all(SET_COOKIE) {
            let cookie_string = cookie_header.to_str().unwrap();
            let cookie = Cookie::parse(cookie_string).unwrap();

            assert_eq!(
                cookie.expires_datetime(),
                Some(OffsetDateTime::UNIX_EPOCH),
                "got expires {:?}, want {:?}",
                cookie.expires_datetime(),
                Some(OffsetDateTime::UNIX_EPOCH),
            );
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));

            expired.push(cookie.name().to_owned());
        }

        expired.sort();
        assert_eq!(expired, [COOKIE_CURRENCY, COOKIE_SESSION]);
    }
}
