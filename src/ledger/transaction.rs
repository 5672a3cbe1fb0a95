//! Defines the transaction model and how a new entry is built from user input.

use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, OffsetDateTime, Time};

use crate::{
    Error,
    currency::{Currency, RateTable},
};

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned, stored as a positive amount.
    #[default]
    Income,
    /// Money spent, stored as a negative amount.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in forms and stores.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }

    /// The sign applied to amounts of this type.
    pub fn sign(&self) -> f64 {
        match self {
            TransactionType::Income => 1.0,
            TransactionType::Expense => -1.0,
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            other => Err(format!("unknown transaction type \"{other}\"")),
        }
    }
}

mod date_format {
    //! Dates are stored as "2026-10-16".
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

    pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = date
            .format(DATE_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Date::parse(&s, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

mod time_format {
    //! Times are stored on a 12-hour clock with minute precision, e.g. "03:45 PM".
    use serde::{Deserialize, Deserializer, Serializer};
    use time::{Time, format_description::BorrowedFormatItem, macros::format_description};

    pub const TIME_FORMAT: &[BorrowedFormatItem] =
        format_description!("[hour repr:12]:[minute] [period]");

    pub fn serialize<S>(time: &Time, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = time
            .format(TIME_FORMAT)
            .map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&formatted)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Time, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Time::parse(&s, TIME_FORMAT).map_err(serde::de::Error::custom)
    }
}

pub(crate) use date_format::DATE_FORMAT;
pub(crate) use time_format::TIME_FORMAT;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// `amount` is always in the base currency and its sign matches `kind`:
/// positive for income and negative for expenses.
///
/// To create a new `Transaction` from user input, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The signed amount in the base currency.
    pub amount: f64,
    /// A text description of what the transaction was for.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The local date the transaction was recorded on.
    #[serde(with = "date_format")]
    pub date: Date,
    /// The local time the transaction was recorded at, to the minute.
    #[serde(with = "time_format")]
    pub time: Time,
    /// The currency the amount was originally entered in.
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_currency: Currency,
}

impl Transaction {
    /// Start building a transaction from a form submission.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(kind: TransactionType, description: &str) -> TransactionBuilder {
        TransactionBuilder {
            kind,
            description: description.trim().to_owned(),
            entry_currency: Currency::default(),
            recorded_at: None,
        }
    }
}

/// A builder that turns the raw amount a user typed into a [Transaction].
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    kind: TransactionType,
    description: String,
    entry_currency: Currency,
    recorded_at: Option<(Date, Time)>,
}

impl TransactionBuilder {
    /// Set the currency the amount was entered in. Defaults to USD.
    pub fn entry_currency(mut self, currency: Currency) -> Self {
        self.entry_currency = currency;
        self
    }

    /// Set the local date and time the transaction was recorded at.
    ///
    /// Defaults to the current UTC date and time.
    pub fn recorded_at(mut self, date: Date, time: Time) -> Self {
        self.recorded_at = Some((date, time));
        self
    }

    /// Parse `raw_amount`, convert it into the base currency and apply the
    /// sign for the transaction type.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidAmount] if `raw_amount` is not a number, is
    /// not a finite number greater than zero, or does not stay one once
    /// converted into the base currency.
    pub fn finalize(self, raw_amount: &str, rates: &RateTable) -> Result<Transaction, Error> {
        let amount = parse_amount(raw_amount)?;
        let base_amount = rates.to_base(amount, self.entry_currency);

        if base_amount == 0.0 {
            return Err(Error::InvalidAmount(format!(
                "\"{}\" is too small.",
                raw_amount.trim()
            )));
        }

        if !base_amount.is_finite() {
            return Err(Error::InvalidAmount(format!(
                "\"{}\" is too large.",
                raw_amount.trim()
            )));
        }

        let (date, time) = self.recorded_at.unwrap_or_else(|| {
            let now = OffsetDateTime::now_utc();
            (now.date(), now.time())
        });
        let time = Time::from_hms(time.hour(), time.minute(), 0).unwrap_or(time);

        Ok(Transaction {
            amount: self.kind.sign() * base_amount,
            description: self.description,
            kind: self.kind,
            date,
            time,
            original_currency: self.entry_currency,
        })
    }
}

/// Parse the amount typed into the add form.
///
/// # Errors
///
/// Returns an [Error::InvalidAmount] with a message that can be shown to the
/// user if the amount is missing, not a number, or not greater than zero.
pub fn parse_amount(raw_amount: &str) -> Result<f64, Error> {
    let raw_amount = raw_amount.trim();

    if raw_amount.is_empty() {
        return Err(Error::InvalidAmount("Enter an amount.".to_owned()));
    }

    let amount: f64 = raw_amount
        .parse()
        .map_err(|_| Error::InvalidAmount(format!("\"{raw_amount}\" is not a number.")))?;

    if !amount.is_finite() {
        return Err(Error::InvalidAmount(format!(
            "\"{raw_amount}\" is not a number."
        )));
    }

    if amount <= 0.0 {
        return Err(Error::InvalidAmount(
            "The amount must be greater than zero.".to_owned(),
        ));
    }

    Ok(amount)
}
