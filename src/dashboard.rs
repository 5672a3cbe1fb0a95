//! The dashboard page: running totals, today's transactions and the add form.

use std::sync::Arc;

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};

use crate::{
    AppState, Currency, Error, LedgerContext, LedgerSummary, RateTable, Username,
    add_transaction::{AddTransactionForm, add_transaction_form},
    auth::get_currency_from_cookies,
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base, format_currency},
    navigation::NavBar,
    stores::LedgerStore,
    summarize,
    timezone::local_today,
    transaction_table::transaction_table,
};

/// The state needed by the pages that read or write a user's ledger.
#[derive(Clone)]
pub struct LedgerViewState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Kolkata".
    pub local_timezone: String,
    /// The exchange rates used to convert amounts.
    pub rates: RateTable,
    /// Where transactions are kept.
    pub ledger_store: Arc<dyn LedgerStore>,
}

impl FromRef<AppState> for LedgerViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            local_timezone: state.local_timezone.clone(),
            rates: state.rates.clone(),
            ledger_store: state.ledger_store.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LedgerViewState> for Key {
    fn from_ref(state: &LedgerViewState) -> Self {
        state.cookie_key.clone()
    }
}

/// Display the totals and today's transactions in the user's display currency.
pub async fn get_dashboard_page(
    State(state): State<LedgerViewState>,
    Extension(username): Extension<Username>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    let currency = get_currency_from_cookies(&jar);
    let add_form = add_transaction_form(&AddTransactionForm::new(currency), None);

    render_dashboard(&state, &username, currency, &add_form).map(IntoResponse::into_response)
}

/// Load the ledger for `username` and render the full dashboard page around
/// `add_form`.
pub(crate) fn render_dashboard(
    state: &LedgerViewState,
    username: &Username,
    currency: Currency,
    add_form: &Markup,
) -> Result<Markup, Error> {
    let today = local_today(&state.local_timezone)?;
    let transactions = state
        .ledger_store
        .transactions(username)
        .inspect_err(|error| tracing::error!("could not load transactions for {username}: {error}"))?;
    let context = LedgerContext {
        currency,
        today,
        rates: &state.rates,
    };
    let summary = summarize(&transactions, &context);

    Ok(dashboard_view(username, &summary, add_form))
}

fn totals_card(id: &str, title: &str, amount: f64, currency: Currency) -> Markup {
    html! {
        div
            id=(id)
            class="flex-1 p-4 bg-white rounded-lg shadow dark:bg-gray-800"
        {
            h2 class="text-sm font-medium text-gray-500 dark:text-gray-400" { (title) }
            span class="amount text-2xl font-semibold" { (format_currency(amount, currency)) }
        }
    }
}

fn dashboard_view(username: &Username, summary: &LedgerSummary<'_>, add_form: &Markup) -> Markup {
    let currency = summary.context.currency;
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW, currency).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-lg space-y-6"
            {
                h1 class="text-2xl font-bold" { "Hello, " (username) }

                section class="flex flex-col sm:flex-row gap-4"
                {
                    (totals_card("balance", "Balance", summary.totals.balance, currency))
                    (totals_card("income", "Income", summary.totals.income, currency))
                    (totals_card("expense", "Expenses", summary.totals.expense, currency))
                }

                section class="p-4 bg-white rounded-lg shadow dark:bg-gray-800"
                {
                    h2 class="mb-4 text-xl font-semibold" { "Add a transaction" }
                    (add_form)
                }

                section id="today"
                {
                    h2 class="mb-4 text-xl font-semibold" { "Today" }

                    @if summary.today.is_empty() {
                        p class="text-gray-500 dark:text-gray-400" { "No transactions recorded today." }
                    } @else {
                        (transaction_table(&summary.today, summary, false))
                    }
                }
            }
        }
    };

    base("Dashboard", &content)
}

#[cfg(test)]
mod dashboard_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::PrivateCookieJar;
    use scraper::{Html, Selector};
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Currency, Transaction, TransactionType, Username,
        auth::set_currency_cookie,
        endpoints,
        test_utils::{
            TEST_USERNAME, assert_hx_endpoint, assert_valid_html, must_get_form,
            parse_html_document, test_state,
        },
    };

    use super::{LedgerViewState, get_dashboard_page};

    fn state() -> LedgerViewState {
        axum::extract::FromRef::from_ref(&test_state())
    }

    fn entry(amount: f64, kind: TransactionType, date: time::Date) -> Transaction {
        Transaction {
            amount,
            description: format!("{} entry", kind.as_str()),
            kind,
            date,
            time: time::macros::time!(09:30),
            original_currency: Currency::Usd,
        }
    }

    #[track_caller]
    fn text_of(html: &Html, selector: &str) -> String {
        html.select(&Selector::parse(selector).unwrap())
            .next()
            .unwrap_or_else(|| panic!("No element matching {selector}"))
            .text()
            .collect::<String>()
            .trim()
            .to_owned()
    }

    async fn get_page(state: LedgerViewState, currency: Currency) -> Html {
        let jar = set_currency_cookie(
            PrivateCookieJar::new(state.cookie_key.clone()),
            currency,
            true,
        );

        let response = get_dashboard_page(
            State(state),
            Extension(Username::new_unchecked(TEST_USERNAME)),
            jar,
        )
        .await
        .expect("Could not render dashboard");

        assert_eq!(response.status(), StatusCode::OK);
        parse_html_document(response).await
    }

    #[tokio::test]
    async fn empty_dashboard_shows_zero_totals_and_add_form() {
        let document = get_page(state(), Currency::Usd).await;

        assert_valid_html(&document);
        assert_eq!(text_of(&document, "#balance .amount"), "$0.00");
        assert_eq!(text_of(&document, "#income .amount"), "$0.00");
        assert_eq!(text_of(&document, "#expense .amount"), "$0.00");
        assert_eq!(text_of(&document, "#today p"), "No transactions recorded today.");

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::ADD_TRANSACTION, "hx-post");
    }

    #[tokio::test]
    async fn totals_are_shown_in_display_currency() {
        let state = state();
        let username = Username::new_unchecked(TEST_USERNAME);
        let today = OffsetDateTime::now_utc().date();
        state
            .ledger_store
            .append(&username, entry(100.0, TransactionType::Income, today))
            .unwrap();
        state
            .ledger_store
            .append(&username, entry(-30.0, TransactionType::Expense, today))
            .unwrap();

        let document = get_page(state, Currency::Inr).await;

        assert_eq!(text_of(&document, "#balance .amount"), "₹5,810.00");
        assert_eq!(text_of(&document, "#income .amount"), "₹8,300.00");
        assert_eq!(text_of(&document, "#expense .amount"), "-₹2,490.00");
    }

    #[tokio::test]
    async fn only_todays_transactions_are_listed_newest_first() {
        let state = state();
        let username = Username::new_unchecked(TEST_USERNAME);
        let today = OffsetDateTime::now_utc().date();
        state
            .ledger_store
            .append(&username, entry(5.0, TransactionType::Income, date!(2020 - 01 - 01)))
            .unwrap();
        state
            .ledger_store
            .append(&username, entry(100.0, TransactionType::Income, today))
            .unwrap();
        state
            .ledger_store
            .append(&username, entry(-30.0, TransactionType::Expense, today))
            .unwrap();

        let document = get_page(state, Currency::Usd).await;

        let types: Vec<&str> = document
            .select(&Selector::parse("#today tbody tr").unwrap())
            .filter_map(|row| row.value().attr("data-type"))
            .collect();
        assert_eq!(types, ["expense", "income"]);
        // Totals still cover every transaction.
        assert_eq!(text_of(&document, "#balance .amount"), "$75.00");
    }
}
