//! Totals and the today/history split that the dashboard and history pages show.

use time::Date;

use crate::currency::{Currency, RateTable};

use super::Transaction;

/// Balance, income and expense totals.
///
/// `income` is the sum of positive amounts and `expense` the sum of negative
/// amounts, so `balance == income + expense`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    /// The sum of every amount.
    pub balance: f64,
    /// The sum of positive amounts.
    pub income: f64,
    /// The sum of negative amounts.
    pub expense: f64,
}

impl Totals {
    /// Convert base currency totals into `currency` for display.
    pub fn convert(&self, currency: Currency, rates: &RateTable) -> Totals {
        Totals {
            balance: rates.convert(self.balance, currency),
            income: rates.convert(self.income, currency),
            expense: rates.convert(self.expense, currency),
        }
    }
}

/// Sum the amounts of `transactions` into [Totals] in the base currency.
pub fn aggregate(transactions: &[Transaction]) -> Totals {
    transactions
        .iter()
        .fold(Totals::default(), |mut totals, transaction| {
            let amount = transaction.amount;
            totals.balance += amount;

            if amount > 0.0 {
                totals.income += amount;
            } else if amount < 0.0 {
                totals.expense += amount;
            }

            totals
        })
}

/// Transactions split by whether they were recorded on the reference date.
///
/// Both lists are ordered newest-inserted first.
#[derive(Debug, Default, PartialEq)]
pub struct Partition<'a> {
    /// Transactions dated on the reference date.
    pub today: Vec<&'a Transaction>,
    /// Every other transaction.
    pub history: Vec<&'a Transaction>,
}

/// Split `transactions`, given in insertion order, into those dated `today`
/// and the rest.
pub fn partition(transactions: &[Transaction], today: Date) -> Partition<'_> {
    let (today, history): (Vec<_>, Vec<_>) = transactions
        .iter()
        .rev()
        .partition(|transaction| transaction.date == today);

    Partition { today, history }
}

/// The per-request inputs to [summarize].
#[derive(Debug, Clone, Copy)]
pub struct LedgerContext<'a> {
    /// The currency to display amounts in.
    pub currency: Currency,
    /// The local date used to decide which transactions happened today.
    pub today: Date,
    /// The rates used to convert from the base currency.
    pub rates: &'a RateTable,
}

impl LedgerContext<'_> {
    /// Convert a base currency amount into the display currency.
    pub fn convert(&self, base_amount: f64) -> f64 {
        self.rates.convert(base_amount, self.currency)
    }
}

/// Everything the ledger pages display for one user.
#[derive(Debug)]
pub struct LedgerSummary<'a> {
    /// The context the summary was computed with.
    pub context: LedgerContext<'a>,
    /// Totals over every transaction, in the display currency.
    pub totals: Totals,
    /// Transactions recorded today, newest first.
    pub today: Vec<&'a Transaction>,
    /// Transactions recorded on other days, newest first.
    pub history: Vec<&'a Transaction>,
}

impl LedgerSummary<'_> {
    /// The amount of `transaction` in the display currency.
    pub fn display_amount(&self, transaction: &Transaction) -> f64 {
        self.context.convert(transaction.amount)
    }

    /// Whether the user has recorded any transactions at all.
    pub fn is_empty(&self) -> bool {
        self.today.is_empty() && self.history.is_empty()
    }
}

/// Aggregate, convert and partition a user's transactions for display.
pub fn summarize<'a>(
    transactions: &'a [Transaction],
    context: &LedgerContext<'a>,
) -> LedgerSummary<'a> {
    let totals = aggregate(transactions).convert(context.currency, context.rates);
    let Partition { today, history } = partition(transactions, context.today);

    LedgerSummary {
        context: *context,
        totals,
        today,
        history,
    }
}
