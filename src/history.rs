//! The history page listing every transaction a user has recorded.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use maud::{Markup, html};

use crate::{
    Error, LedgerContext, LedgerSummary, Transaction, Username,
    auth::get_currency_from_cookies,
    dashboard::LedgerViewState,
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base, link},
    navigation::NavBar,
    summarize,
    timezone::local_today,
    transaction_table::transaction_table,
};

/// Display all of the user's transactions, newest first, split into today
/// and earlier.
pub async fn get_history_page(
    State(state): State<LedgerViewState>,
    Extension(username): Extension<Username>,
    jar: PrivateCookieJar,
) -> Result<Response, Error> {
    let currency = get_currency_from_cookies(&jar);
    let today = local_today(&state.local_timezone)?;
    let transactions = state
        .ledger_store
        .transactions(&username)
        .inspect_err(|error| tracing::error!("could not load transactions for {username}: {error}"))?;
    let context = LedgerContext {
        currency,
        today,
        rates: &state.rates,
    };
    let summary = summarize(&transactions, &context);

    Ok(history_view(&summary).into_response())
}

fn history_section(
    id: &str,
    title: &str,
    transactions: &[&Transaction],
    summary: &LedgerSummary<'_>,
) -> Markup {
    html! {
        @if !transactions.is_empty() {
            section id=(id)
            {
                h2 class="mb-4 text-xl font-semibold" { (title) }
                (transaction_table(transactions, summary, true))
            }
        }
    }
}

fn history_view(summary: &LedgerSummary<'_>) -> Markup {
    let nav_bar = NavBar::new(endpoints::HISTORY_VIEW, summary.context.currency).into_html();

    let content = html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-screen-lg space-y-6"
            {
                h1 class="text-2xl font-bold" { "History" }

                @if summary.is_empty() {
                    p
                    {
                        "Nothing here yet. Record your first transaction on the "
                        (link(endpoints::DASHBOARD_VIEW, "dashboard"))
                        "."
                    }
                } @else {
                    (history_section("today", "Today", &summary.today, summary))
                    (history_section("earlier", "Earlier", &summary.history, summary))
                }
            }
        }
    };

    base("History", &content)
}
