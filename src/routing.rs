//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_htmx::HxRedirect;
use tower_http::services::ServeDir;

use crate::{
    AppState,
    add_transaction::post_add_transaction,
    auth::auth_guard,
    dashboard::get_dashboard_page,
    endpoints,
    history::get_history_page,
    internal_server_error::get_internal_server_error_page,
    log_in::{get_index_page, post_auth},
    log_out::get_log_out,
    not_found::get_404_not_found,
    toggle_currency::get_toggle_currency,
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::AUTH, post(post_auth))
        .route(endpoints::TOGGLE_CURRENCY, get(get_toggle_currency))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::HISTORY_VIEW, get(get_history_page))
        .route(endpoints::ADD_TRANSACTION, post(post_add_transaction))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Redirect the client to `url`.
///
/// HTMX requests get the `HX-Redirect` header so that the whole page
/// changes, plain requests get a 303.
pub(crate) fn redirect_to(is_htmx: bool, url: &str) -> Response {
    if is_htmx {
        (HxRedirect(url.to_owned()), StatusCode::OK).into_response()
    } else {
        Redirect::to(url).into_response()
    }
}

#[cfg(test)]
mod routing_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;

    use crate::{
        Username,
        auth::{COOKIE_CURRENCY, COOKIE_SESSION},
        endpoints,
        test_utils::{TEST_PASSWORD, TEST_USERNAME, test_state},
    };

    use super::build_router;

    fn test_server() -> (TestServer, crate::AppState) {
        let state = test_state();
        let server =
            TestServer::new(build_router(state.clone())).expect("Could not create test server.");

        (server, state)
    }

    async fn log_in(server: &TestServer) -> Cookie<'static> {
        let response = server
            .post(endpoints::AUTH)
            .form(&[
                ("action", "login"),
                ("username", TEST_USERNAME),
                ("password", TEST_PASSWORD),
            ])
            .await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::DASHBOARD_VIEW);

        response.cookie(COOKIE_SESSION)
    }

    #[tokio::test]
    async fn protected_pages_redirect_to_root_without_session() {
        let (server, _) = test_server();

        for endpoint in [endpoints::DASHBOARD_VIEW, endpoints::HISTORY_VIEW] {
            let response = server.get(endpoint).await;

            response.assert_status_see_other();
            assert_eq!(response.header("location"), endpoints::ROOT);
        }

        let response = server
            .post(endpoints::ADD_TRANSACTION)
            .form(&[("amount", "5"), ("type", "income")])
            .await;
        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::ROOT);
    }

    #[tokio::test]
    async fn unauthenticated_add_does_not_store_anything() {
        let (server, state) = test_server();

        server
            .post(endpoints::ADD_TRANSACTION)
            .form(&[("amount", "5"), ("type", "income")])
            .await;

        let transactions = state
            .ledger_store
            .transactions(&Username::new_unchecked(TEST_USERNAME))
            .unwrap();
        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn log_in_then_view_dashboard() {
        let (server, _) = test_server();
        let session = log_in(&server).await;

        let response = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(session)
            .await;

        response.assert_status_ok();
        assert!(response.text().contains(&format!("Hello, {TEST_USERNAME}")));
    }

    #[tokio::test]
    async fn sign_up_then_add_and_see_history() {
        let (server, state) = test_server();

        let response = server
            .post(endpoints::AUTH)
            .form(&[
                ("action", "signup"),
                ("username", "ravi"),
                ("password", "iasbdf8934nbfds09u4Hq"),
            ])
            .await;
        response.assert_status_see_other();
        let session = response.cookie(COOKIE_SESSION);

        let response = server
            .post(endpoints::ADD_TRANSACTION)
            .add_cookie(session.clone())
            .form(&[
                ("amount", "50"),
                ("description", "Chai"),
                ("type", "expense"),
                ("entry_currency", "INR"),
            ])
            .await;
        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::DASHBOARD_VIEW);

        let transactions = state
            .ledger_store
            .transactions(&Username::new_unchecked("ravi"))
            .unwrap();
        assert_eq!(transactions.len(), 1);
        assert!((transactions[0].amount + 50.0 / 83.0).abs() < 1e-9);

        let response = server
            .get(endpoints::HISTORY_VIEW)
            .add_cookie(session)
            .await;
        response.assert_status_ok();
        assert!(response.text().contains("Chai"));
    }

    #[tokio::test]
    async fn rejected_amount_leaves_ledger_unchanged() {
        let (server, state) = test_server();
        let session = log_in(&server).await;

        let response = server
            .post(endpoints::ADD_TRANSACTION)
            .add_cookie(session)
            .add_header("HX-Request", "true")
            .form(&[("amount", "abc"), ("type", "income")])
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("is not a number"));
        let transactions = state
            .ledger_store
            .transactions(&Username::new_unchecked(TEST_USERNAME))
            .unwrap();
        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn toggle_currency_switches_dashboard_to_inr() {
        let (server, _) = test_server();
        let session = log_in(&server).await;

        let response = server.get(endpoints::TOGGLE_CURRENCY).await;
        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::DASHBOARD_VIEW);
        let currency = response.cookie(COOKIE_CURRENCY);

        let response = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(session)
            .add_cookie(currency)
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("₹0.00"));
    }

    #[tokio::test]
    async fn log_out_ends_session() {
        let (server, _) = test_server();
        let session = log_in(&server).await;

        let response = server.get(endpoints::LOG_OUT).add_cookie(session).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::ROOT);
        let cleared = response.cookie(COOKIE_SESSION);
        assert_eq!(cleared.max_age(), Some(time::Duration::ZERO));

        let response = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(cleared)
            .await;
        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::ROOT);
    }

    #[tokio::test]
    async fn cookies_are_not_secure_without_tls() {
        let mut state = test_state();
        state.secure_cookies = false;
        let server = TestServer::new(build_router(state)).expect("Could not create test server.");

        let session = log_in(&server).await;
        assert_ne!(session.secure(), Some(true));

        let response = server
            .get(endpoints::TOGGLE_CURRENCY)
            .add_cookie(session)
            .await;
        assert_ne!(response.cookie(COOKIE_CURRENCY).secure(), Some(true));
    }

    #[tokio::test]
    async fn cookies_are_secure_by_default() {
        let (server, _) = test_server();

        let session = log_in(&server).await;

        assert_eq!(session.secure(), Some(true));
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (server, _) = test_server();

        let response = server.get("/does-not-exist").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn error_page_is_served() {
        let (server, _) = test_server();

        let response = server.get(endpoints::INTERNAL_ERROR_VIEW).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    }
}
