//! The endpoint URIs.

/// The root route which shows the log in page or redirects to the dashboard.
pub const ROOT: &str = "/";
/// The route that handles both log in and sign up form submissions.
pub const AUTH: &str = "/auth";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The route for adding an income or expense.
pub const ADD_TRANSACTION: &str = "/add";
/// The route that switches the display currency.
pub const TOGGLE_CURRENCY: &str = "/toggle_currency";
/// The page listing every transaction.
pub const HISTORY_VIEW: &str = "/history";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/logout";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";
