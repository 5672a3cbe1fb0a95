//! Small dismissible alerts for reporting errors in response to HTMX requests.
//!
//! Alerts are swapped out-of-band into the `#alert-container` element that
//! [crate::html::base] places on every page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::{Markup, html};

/// An error message with a title and optional details.
#[derive(Debug, Clone)]
pub struct Alert<'a> {
    pub message: &'a str,
    pub details: &'a str,
}

impl<'a> Alert<'a> {
    /// Create a new error alert
    pub fn error(message: &'a str, details: &'a str) -> Self {
        Self { message, details }
    }

    pub fn into_html(self) -> Markup {
        html! {
            div id="alert-container" hx-swap-oob="true" class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div
                    class="p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
                        dark:bg-gray-800 dark:text-red-400"
                    role="alert"
                {
                    span class="font-medium" { (self.message) }

                    @if !self.details.is_empty()
                    {
                        " " (self.details)
                    }

                    button
                        type="button"
                        class="ms-2 font-medium underline"
                        onclick="this.closest('#alert-container').classList.add('hidden')"
                    {
                        "Dismiss"
                    }
                }
            }
        }
    }

    /// Render the alert with `status_code`.
    pub fn into_response_with_status(self, status_code: StatusCode) -> Response {
        (status_code, Html(self.into_html().into_string())).into_response()
    }
}

#[cfg(test)]
mod alert_tests {
    use axum::http::StatusCode;
    use scraper::{Html, Selector};

    use super::Alert;

    #[tokio::test]
    async fn error_alert_has_message_details_and_status() {
        let response = Alert::error("Invalid amount", "Enter an amount.")
            .into_response_with_status(StatusCode::BAD_REQUEST);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = Html::parse_fragment(&String::from_utf8_lossy(&body));
        let alert = html
            .select(&Selector::parse("[role=alert]").unwrap())
            .next()
            .expect("No alert found");
        let text = alert.text().collect::<String>();

        assert!(text.contains("Invalid amount"));
        assert!(text.contains("Enter an amount."));
    }
}
