//! Currencies, their symbols, and the table of rates used to convert between
//! the base currency and the display currency.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The number of Indian rupees per US dollar used when no rate is configured.
pub const DEFAULT_INR_PER_USD: f64 = 83.0;

/// The currency that every amount is persisted in.
pub const BASE_CURRENCY: Currency = Currency::Usd;

/// A currency supported by the app.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// United States dollar.
    #[default]
    #[serde(rename = "USD")]
    Usd,
    /// Indian rupee.
    #[serde(rename = "INR")]
    Inr,
}

impl Currency {
    /// Every supported currency.
    pub const ALL: [Currency; 2] = [Currency::Usd, Currency::Inr];

    /// The ISO 4217 code, e.g. "USD".
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Inr => "INR",
        }
    }

    /// The symbol shown in front of amounts.
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Inr => "₹",
        }
    }

    /// The other currency, used by the display currency toggle.
    pub fn toggle(&self) -> Currency {
        match self {
            Currency::Usd => Currency::Inr,
            Currency::Inr => Currency::Usd,
        }
    }

    fn default_rate(&self) -> f64 {
        match self {
            Currency::Usd => 1.0,
            Currency::Inr => DEFAULT_INR_PER_USD,
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();

        Currency::ALL
            .into_iter()
            .find(|currency| currency.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| Error::UnsupportedCurrency(code.to_owned()))
    }
}

/// A currency code paired with its rate, e.g. "INR=83".
///
/// Used to read rate overrides from the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateEntry {
    /// The currency the rate applies to.
    pub currency: Currency,
    /// Units of `currency` per one unit of the base currency.
    pub rate: f64,
}

impl FromStr for RateEntry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (code, rate) = s
            .split_once('=')
            .ok_or_else(|| Error::InvalidRate(format!("expected CODE=RATE, got \"{s}\"")))?;

        let currency = code.parse()?;
        let rate = rate
            .trim()
            .parse()
            .map_err(|_| Error::InvalidRate(format!("\"{rate}\" is not a number")))?;

        Ok(Self { currency, rate })
    }
}

/// Units of each currency per one unit of [BASE_CURRENCY].
///
/// Every supported currency always has a rate and the base currency's rate
/// is always one.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    rates: HashMap<Currency, f64>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            rates: Currency::ALL
                .into_iter()
                .map(|currency| (currency, currency.default_rate()))
                .collect(),
        }
    }
}

impl RateTable {
    /// Create a rate table from the defaults with `overrides` applied.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidRate] if a rate is not a finite, positive
    /// number, or if an override tries to change the base currency's rate.
    pub fn new(overrides: impl IntoIterator<Item = RateEntry>) -> Result<Self, Error> {
        let mut table = Self::default();

        for RateEntry { currency, rate } in overrides {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(Error::InvalidRate(format!(
                    "the rate for {currency} must be a positive number, got {rate}"
                )));
            }

            if currency == BASE_CURRENCY && rate != 1.0 {
                return Err(Error::InvalidRate(format!(
                    "{currency} is the base currency and its rate must be 1"
                )));
            }

            table.rates.insert(currency, rate);
        }

        Ok(table)
    }

    /// Units of `currency` per one unit of the base currency.
    pub fn rate(&self, currency: Currency) -> f64 {
        self.rates
            .get(&currency)
            .copied()
            .unwrap_or_else(|| currency.default_rate())
    }

    /// Convert an amount in the base currency into `currency` for display.
    pub fn convert(&self, base_amount: f64, currency: Currency) -> f64 {
        if currency == BASE_CURRENCY {
            return base_amount;
        }

        base_amount * self.rate(currency)
    }

    /// Convert an amount entered in `currency` into the base currency.
    pub fn to_base(&self, amount: f64, currency: Currency) -> f64 {
        if currency == BASE_CURRENCY {
            return amount;
        }

        amount / self.rate(currency)
    }
}
