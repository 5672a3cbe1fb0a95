//! The ledger: transactions and the aggregation that turns them into the
//! totals and lists shown on the dashboard and history pages.

mod aggregation;
mod transaction;

pub use aggregation::{
    LedgerContext, LedgerSummary, Partition, Totals, aggregate, partition, summarize,
};
pub use transaction::{Transaction, TransactionBuilder, TransactionType, parse_amount};
pub(crate) use transaction::{DATE_FORMAT, TIME_FORMAT};
