//! Pocket Ledger is a small web app for recording income and expenses and
//! viewing the running balance in either US dollars or Indian rupees.
//!
//! This library provides the HTTP routes, which directly serve HTML pages,
//! together with the ledger aggregation logic and the stores that persist
//! users and their transactions.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use tokio::signal;

mod add_transaction;
mod alert;
mod app_state;
mod auth;
mod currency;
mod dashboard;
mod endpoints;
mod history;
mod html;
mod internal_server_error;
mod ledger;
mod log_in;
mod log_out;
mod logging;
mod navigation;
mod not_found;
mod password;
mod routing;
pub mod stores;
mod timezone;
mod toggle_currency;
mod transaction_table;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use currency::{BASE_CURRENCY, Currency, DEFAULT_INR_PER_USD, RateEntry, RateTable};
pub use ledger::{
    LedgerContext, LedgerSummary, Partition, Totals, Transaction, TransactionBuilder,
    TransactionType, aggregate, parse_amount, partition, summarize,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use user::{User, Username};

use crate::{alert::Alert, internal_server_error::InternalServerError, not_found::NotFound};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The session cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The session cookie could not be read or written.
    ///
    /// Callers should pass in the original error as a string.
    #[error("could not read or write the session cookie: {0}")]
    InvalidSessionCookie(String),

    /// A user tried to sign up with a username that is already taken.
    #[error("the username \"{0}\" is already taken")]
    DuplicateUsername(String),

    /// The username was empty or too long.
    #[error("{0}")]
    InvalidUsername(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The amount entered for a transaction could not be used.
    ///
    /// The string explains the problem and is safe to show to the user.
    #[error("{0}")]
    InvalidAmount(String),

    /// A currency code that is not supported by the app.
    #[error("unsupported currency \"{0}\"")]
    UnsupportedCurrency(String),

    /// An exchange rate that is zero, negative or not a number.
    #[error("invalid exchange rate: {0}")]
    InvalidRate(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Reading or writing a store file failed.
    #[error("could not access the store file: {0}")]
    StoreIoError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFound.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Render the error as a small alert for HTMX requests.
    fn into_alert_response(self) -> Response {
        match self {
            Error::InvalidTimezoneError(timezone) => Alert::error(
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            )
            .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR),
            Error::InvalidAmount(message) => Alert::error("Invalid amount", &message)
                .into_response_with_status(StatusCode::BAD_REQUEST),
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                Alert::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                )
                .into_response_with_status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
