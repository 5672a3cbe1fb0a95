//! The form and handler for recording income and expenses.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar};
use axum_htmx::HxRequest;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};

use crate::{
    Currency, Error, Transaction, TransactionType, Username,
    auth::get_currency_from_cookies,
    dashboard::{LedgerViewState, render_dashboard},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_ERROR_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner,
    },
    routing::redirect_to,
    timezone::local_now,
};

/// The raw data entered by the user in the add form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTransactionForm {
    /// The amount as typed, validated when the transaction is built.
    #[serde(default)]
    pub amount: String,
    /// What the money was for.
    #[serde(default)]
    pub description: String,
    /// Whether the money was earned or spent.
    #[serde(rename = "type", default)]
    pub kind: TransactionType,
    /// The currency the amount was typed in.
    #[serde(default)]
    pub entry_currency: Currency,
}

impl AddTransactionForm {
    /// An empty form with `entry_currency` preselected.
    pub fn new(entry_currency: Currency) -> Self {
        Self {
            amount: String::new(),
            description: String::new(),
            kind: TransactionType::default(),
            entry_currency,
        }
    }
}

/// Record a transaction for the logged in user.
///
/// The amount is converted from the entry currency into the base currency
/// and stamped with the server's local date and time. An invalid amount is
/// reported on the form and nothing is stored.
pub async fn post_add_transaction(
    State(state): State<LedgerViewState>,
    Extension(username): Extension<Username>,
    HxRequest(is_htmx): HxRequest,
    jar: PrivateCookieJar,
    Form(form): Form<AddTransactionForm>,
) -> Response {
    let now = match local_now(&state.local_timezone) {
        Ok(now) => now,
        Err(error) => return error_response(is_htmx, error),
    };

    let transaction = Transaction::build(form.kind, &form.description)
        .entry_currency(form.entry_currency)
        .recorded_at(now.date(), now.time())
        .finalize(&form.amount, &state.rates);

    let transaction = match transaction {
        Ok(transaction) => transaction,
        Err(Error::InvalidAmount(message)) => {
            tracing::debug!("Rejected amount {:?} from {username}: {message}", form.amount);
            return invalid_form_response(is_htmx, &state, &username, &jar, &form, &message);
        }
        Err(error) => return error_response(is_htmx, error),
    };

    if let Err(error) = state.ledger_store.append(&username, transaction) {
        tracing::error!("Could not add transaction for {username}: {error}");
        return error_response(is_htmx, error);
    }

    redirect_to(is_htmx, endpoints::DASHBOARD_VIEW)
}

fn error_response(is_htmx: bool, error: Error) -> Response {
    if is_htmx {
        error.into_alert_response()
    } else {
        error.into_response()
    }
}

fn invalid_form_response(
    is_htmx: bool,
    state: &LedgerViewState,
    username: &Username,
    jar: &PrivateCookieJar,
    form: &AddTransactionForm,
    message: &str,
) -> Response {
    let add_form = add_transaction_form(form, Some(message));

    if is_htmx {
        // HTMX only swaps successful responses into the form.
        return Html(add_form.into_string()).into_response();
    }

    let currency = get_currency_from_cookies(jar);
    match render_dashboard(state, username, currency, &add_form) {
        Ok(page) => (StatusCode::BAD_REQUEST, page).into_response(),
        Err(error) => error.into_response(),
    }
}

/// The add form, filled in with `form` and showing `error_message` under the
/// amount if there is one.
pub fn add_transaction_form(form: &AddTransactionForm, error_message: Option<&str>) -> Markup {
    html! {
        form
            method="post"
            action=(endpoints::ADD_TRANSACTION)
            hx-post=(endpoints::ADD_TRANSACTION)
            hx-swap="outerHTML"
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            class="space-y-4"
        {
            div class="grid gap-4 sm:grid-cols-3"
            {
                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    input
                        type="text"
                        inputmode="decimal"
                        name="amount"
                        id="amount"
                        placeholder="0.00"
                        class=(FORM_TEXT_INPUT_STYLE)
                        required
                        value=(form.amount);
                }

                div class="sm:col-span-2"
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                    input
                        type="text"
                        name="description"
                        id="description"
                        placeholder="Groceries"
                        class=(FORM_TEXT_INPUT_STYLE)
                        value=(form.description);
                }
            }

            @if let Some(error_message) = error_message {
                p class=(FORM_ERROR_STYLE) { (error_message) }
            }

            div class="flex flex-wrap items-center gap-6"
            {
                fieldset class=(FORM_RADIO_GROUP_STYLE)
                {
                    legend class="sr-only" { "Type" }

                    @for kind in [TransactionType::Income, TransactionType::Expense] {
                        label class="flex items-center gap-2"
                        {
                            input
                                type="radio"
                                name="type"
                                value=(kind.as_str())
                                class=(FORM_RADIO_INPUT_STYLE)
                                checked[form.kind == kind];

                            (kind.as_str())
                        }
                    }
                }

                div class="flex items-center gap-2"
                {
                    label for="entry_currency" class="text-sm font-medium" { "Currency" }

                    select
                        name="entry_currency"
                        id="entry_currency"
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for currency in Currency::ALL {
                            option value=(currency.code()) selected[form.entry_currency == currency]
                            {
                                (currency.symbol()) " " (currency.code())
                            }
                        }
                    }
                }
            }

            button type="submit" id="indicator" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="htmx-indicator" { (loading_spinner()) }
                "Add"
            }
        }
    }
}
