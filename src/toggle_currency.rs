//! Switches the display currency between US dollars and Indian rupees.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    auth::{AuthState, get_currency_from_cookies, set_currency_cookie},
    endpoints,
};

/// Flip the display currency stored in the currency cookie and send the
/// client back to the dashboard.
///
/// Amounts in the store are never touched, only how they are displayed.
pub async fn get_toggle_currency(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> Response {
    let currency = get_currency_from_cookies(&jar).toggle();
    tracing::debug!("Display currency set to {currency}");

    (
        set_currency_cookie(jar, currency, state.secure_cookies),
        Redirect::to(endpoints::DASHBOARD_VIEW),
    )
        .into_response()
}
