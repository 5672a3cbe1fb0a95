//! The log-in/sign-up page and the handler that authenticates or registers users.

use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRequest;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, User, Username, ValidatedPassword,
    auth::{get_token_from_cookies, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        base, log_in_register, password_input,
    },
    routing::redirect_to,
    stores::UserStore,
};

/// The message shown when the username or password does not match a user.
pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect username or password.";

const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

/// The state needed to log in or sign up.
#[derive(Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which session cookies are valid.
    pub cookie_duration: Duration,
    /// Whether cookies are marked `Secure`.
    pub secure_cookies: bool,
    /// Where user accounts are kept.
    pub user_store: Arc<dyn UserStore>,
    /// The bcrypt cost used to hash new passwords.
    pub hash_cost: u32,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            secure_cookies: state.secure_cookies,
            user_store: state.user_store.clone(),
            hash_cost: state.hash_cost,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// Which button the user pressed on the log-in/sign-up form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthAction {
    /// Check the credentials of an existing user.
    Login,
    /// Register a new user.
    Signup,
}

/// The raw data entered by the user in the log-in/sign-up form.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthForm {
    /// Whether to log in or sign up.
    pub action: AuthAction,
    /// The username as typed.
    pub username: String,
    /// The password as typed.
    pub password: String,
}

/// Why a log-in or sign-up attempt was turned away.
#[derive(Debug, PartialEq)]
struct AuthFailure {
    status: StatusCode,
    message: String,
}

impl AuthFailure {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn invalid_credentials() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS_ERROR_MSG)
    }

    fn internal() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MSG)
    }
}

/// Display the log-in/sign-up page, or send logged in users to the dashboard.
pub async fn get_index_page(jar: PrivateCookieJar) -> Response {
    if get_token_from_cookies(&jar).is_ok() {
        return Redirect::to(endpoints::DASHBOARD_VIEW).into_response();
    }

    Html(auth_page(&auth_form("", None)).into_string()).into_response()
}

/// Handler for log-in and sign-up requests via the POST method.
///
/// Both actions set the session cookie and redirect the client to the
/// dashboard on success. A new user is logged in straight away.
/// Otherwise, the form is returned with an error message explaining the
/// problem: as a fragment for HTMX requests and as a full page for plain form
/// posts.
pub async fn post_auth(
    State(state): State<LoginState>,
    HxRequest(is_htmx): HxRequest,
    jar: PrivateCookieJar,
    Form(form): Form<AuthForm>,
) -> Response {
    let result = match form.action {
        AuthAction::Login => verify_credentials(state.user_store.as_ref(), &form),
        AuthAction::Signup => register_user(state.user_store.as_ref(), &form, state.hash_cost),
    };

    let username = match result {
        Ok(username) => username,
        Err(failure) => {
            return render_form(is_htmx, failure.status, &form.username, &failure.message);
        }
    };

    match set_auth_cookie(jar, &username, state.cookie_duration, state.secure_cookies) {
        Ok(jar) => {
            tracing::info!("User {username} logged in");
            (jar, redirect_to(is_htmx, endpoints::DASHBOARD_VIEW)).into_response()
        }
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            render_form(
                is_htmx,
                StatusCode::INTERNAL_SERVER_ERROR,
                &form.username,
                INTERNAL_ERROR_MSG,
            )
        }
    }
}

fn verify_credentials(user_store: &dyn UserStore, form: &AuthForm) -> Result<Username, AuthFailure> {
    let username = Username::new(&form.username).map_err(|_| AuthFailure::invalid_credentials())?;

    let user = match user_store.get(&username) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(AuthFailure::invalid_credentials()),
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return Err(AuthFailure::internal());
        }
    };

    match user.password_hash.verify(&form.password) {
        Ok(true) => Ok(user.username),
        Ok(false) => Err(AuthFailure::invalid_credentials()),
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            Err(AuthFailure::internal())
        }
    }
}

fn register_user(
    user_store: &dyn UserStore,
    form: &AuthForm,
    hash_cost: u32,
) -> Result<Username, AuthFailure> {
    let username = Username::new(&form.username)
        .map_err(|error| AuthFailure::new(StatusCode::BAD_REQUEST, error.to_string()))?;

    let password = match ValidatedPassword::new(&form.password, &[username.as_ref()]) {
        Ok(password) => password,
        Err(Error::TooWeak(feedback)) if feedback.trim().is_empty() => {
            return Err(AuthFailure::new(
                StatusCode::BAD_REQUEST,
                "Password is too weak. Try a longer password.",
            ));
        }
        Err(Error::TooWeak(feedback)) => {
            return Err(AuthFailure::new(
                StatusCode::BAD_REQUEST,
                format!("Password is too weak. {feedback}"),
            ));
        }
        Err(error) => {
            tracing::error!("Unhandled error while validating password: {error}");
            return Err(AuthFailure::internal());
        }
    };

    let password_hash = PasswordHash::new(password, hash_cost).map_err(|error| {
        tracing::error!("Could not hash password: {error}");
        AuthFailure::internal()
    })?;

    match user_store.create(User::new(username.clone(), password_hash)) {
        Ok(()) => {
            tracing::info!("Registered new user {username}");
            Ok(username)
        }
        Err(Error::DuplicateUsername(_)) => Err(AuthFailure::new(
            StatusCode::CONFLICT,
            "That username is already taken.",
        )),
        Err(error) => {
            tracing::error!("Could not create user {username}: {error}");
            Err(AuthFailure::internal())
        }
    }
}

fn render_form(is_htmx: bool, status: StatusCode, username: &str, message: &str) -> Response {
    let form = auth_form(username, Some(message));

    if is_htmx {
        // HTMX only swaps successful responses.
        (StatusCode::OK, Html(form.into_string())).into_response()
    } else {
        (status, Html(auth_page(&form).into_string())).into_response()
    }
}

fn auth_page(form: &Markup) -> Markup {
    base("Log in", &log_in_register("Log in or sign up", form))
}

fn auth_form(username: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::AUTH)
            hx-post=(endpoints::AUTH)
            hx-swap="outerHTML"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="username" class=(FORM_LABEL_STYLE) { "Username" }

                input
                    type="text"
                    name="username"
                    id="username"
                    autocomplete="username"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus
                    value=(username);
            }

            (password_input("", error_message))

            div class="flex gap-4"
            {
                button type="submit" name="action" value="login" class=(BUTTON_PRIMARY_STYLE)
                {
                    "Log in"
                }

                button type="submit" name="action" value="signup" class=(BUTTON_SECONDARY_STYLE)
                {
                    "Sign up"
                }
            }
        }
    }
}
