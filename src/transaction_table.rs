//! The table of transactions shown on the dashboard and history pages.

use std::borrow::Cow;

use maud::{Markup, html};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    LedgerSummary, Transaction, TransactionType,
    html::{TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency},
    ledger::{DATE_FORMAT, TIME_FORMAT},
};

/// Descriptions longer than this many graphemes are shortened in the table.
pub const MAX_DESCRIPTION_GRAPHEMES: usize = 40;

/// Shorten `description` to at most `max_graphemes` user-perceived
/// characters, ending with "…" when something was cut off.
pub fn truncate_description(description: &str, max_graphemes: usize) -> Cow<'_, str> {
    let mut graphemes = description.grapheme_indices(true);

    match graphemes.nth(max_graphemes) {
        None => Cow::Borrowed(description),
        Some(_) => {
            // Leave room for the ellipsis.
            let cut = description
                .grapheme_indices(true)
                .nth(max_graphemes.saturating_sub(1))
                .map(|(index, _)| index)
                .unwrap_or(0);

            Cow::Owned(format!("{}…", description[..cut].trim_end()))
        }
    }
}

/// Render `transactions` in the display currency of `summary`.
///
/// The date column is only shown when `show_date` is set.
pub fn transaction_table(
    transactions: &[&Transaction],
    summary: &LedgerSummary<'_>,
    show_date: bool,
) -> Markup {
    let currency = summary.context.currency;

    html! {
        div class="relative overflow-x-auto shadow-md rounded-lg w-full"
        {
            table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        @if show_date {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                        }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Time" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                        th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Entered in" }
                    }
                }

                tbody
                {
                    @for transaction in transactions {
                        @let amount_style = match transaction.kind {
                            TransactionType::Income => "text-green-600 dark:text-green-400",
                            TransactionType::Expense => "text-red-600 dark:text-red-400",
                        };

                        tr class=(TABLE_ROW_STYLE) data-type=(transaction.kind.as_str())
                        {
                            @if show_date {
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (transaction.date.format(DATE_FORMAT).unwrap_or_default())
                                }
                            }

                            td class=(TABLE_CELL_STYLE)
                            {
                                (transaction.time.format(TIME_FORMAT).unwrap_or_default())
                            }

                            td class=(TABLE_CELL_STYLE) title=(transaction.description)
                            {
                                (truncate_description(&transaction.description, MAX_DESCRIPTION_GRAPHEMES))
                            }

                            td class=(TABLE_CELL_STYLE) { (transaction.kind.as_str()) }

                            td class={ (TABLE_CELL_STYLE) " text-right " (amount_style) }
                            {
                                (format_currency(summary.display_amount(transaction), currency))
                            }

                            td class=(TABLE_CELL_STYLE) { (transaction.original_currency.code()) }
                        }
                    }
                }
            }
        }
    }
}
