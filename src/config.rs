//! Pricing Configuration
//!
//! Business constants that bound every composition: the ceiling on the
//! combined percentage discount, the deposit fraction and the quoting currency.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::iso::{CLP, Currency, EUR, USD};
use serde::Deserialize;
use thiserror::Error;

use crate::rates::{fraction, round_minor};

/// Configuration parsing errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage format: {0}")]
    InvalidPercentage(String),

    /// Percentage outside `[0, 1]`
    #[error("{field} must be between 0% and 100%, got {value}")]
    OutOfRange {
        /// Offending setting
        field: &'static str,
        /// Configured value
        value: String,
    },

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),
}

/// Pricing policy applied by the composer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingPolicy {
    /// Ceiling on the combined percentage discount (buckets plus percentage code)
    pub max_combined_discount: Percentage,

    /// Fraction of the payable total taken as deposit
    pub deposit_fraction: Percentage,

    /// Quoting currency
    pub currency: &'static Currency,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            max_combined_discount: Percentage::from(Decimal::new(75, 2)),
            deposit_fraction: Percentage::from(Decimal::new(40, 2)),
            currency: CLP,
        }
    }
}

impl PricingPolicy {
    /// Parse a policy from YAML, falling back to defaults for omitted settings.
    ///
    /// ```yaml
    /// max_combined_discount: 75%
    /// deposit: 40%
    /// currency: CLP
    /// ```
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is malformed or a setting is invalid.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let fixture: PolicyFixture = serde_norway::from_str(contents)?;

        fixture.try_into()
    }
}

/// Policy as written in YAML
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PolicyFixture {
    /// Combined discount ceiling (e.g., "75%")
    pub max_combined_discount: Option<String>,

    /// Deposit fraction (e.g., "40%")
    pub deposit: Option<String>,

    /// ISO currency code (e.g., "CLP")
    pub currency: Option<String>,
}

impl TryFrom<PolicyFixture> for PricingPolicy {
    type Error = ConfigError;

    fn try_from(fixture: PolicyFixture) -> Result<Self, Self::Error> {
        let defaults = PricingPolicy::default();

        let max_combined_discount = fixture
            .max_combined_discount
            .as_deref()
            .map(|value| parse_unit_percentage("max_combined_discount", value))
            .transpose()?
            .unwrap_or(defaults.max_combined_discount);

        let deposit_fraction = fixture
            .deposit
            .as_deref()
            .map(|value| parse_unit_percentage("deposit", value))
            .transpose()?
            .unwrap_or(defaults.deposit_fraction);

        let currency = fixture
            .currency
            .as_deref()
            .map(parse_currency)
            .transpose()?
            .unwrap_or(defaults.currency);

        Ok(PricingPolicy {
            max_combined_discount,
            deposit_fraction,
            currency,
        })
    }
}

/// Parse a percentage that must lie in `[0, 1]`.
fn parse_unit_percentage(field: &'static str, value: &str) -> Result<Percentage, ConfigError> {
    let percent = parse_percentage(value)?;
    let value_fraction = fraction(percent);

    if value_fraction < Decimal::ZERO || value_fraction > Decimal::ONE {
        return Err(ConfigError::OutOfRange {
            field,
            value: value.to_string(),
        });
    }

    Ok(percent)
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// Accepts two formats:
/// - Percentage format: "15%" for 15%
/// - Decimal format: "0.15" for 15%
///
/// # Errors
///
/// Returns an error if the string cannot be parsed.
pub fn parse_percentage(s: &str) -> Result<Percentage, ConfigError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        let points = percent_str
            .trim()
            .parse::<Decimal>()
            .map_err(|_err| ConfigError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(points / Decimal::ONE_HUNDRED))
    } else {
        let value = trimmed
            .parse::<Decimal>()
            .map_err(|_err| ConfigError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}

/// Look up a supported currency by ISO code.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownCurrency`] for unsupported codes.
pub fn parse_currency(code: &str) -> Result<&'static Currency, ConfigError> {
    match code.trim() {
        "CLP" => Ok(CLP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(ConfigError::UnknownCurrency(other.to_string())),
    }
}

/// Parse price string (e.g., "100000 CLP" or "12.50 USD") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed, or if the currency code is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), ConfigError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(ConfigError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let currency = parse_currency(currency_code)?;

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| ConfigError::InvalidPrice(s.to_string()))?;

    let minor_units =
        major_to_minor(amount, currency).ok_or_else(|| ConfigError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Convert an amount in major units (e.g. 12.50 USD) into minor units (1250 cents).
///
/// Fractions of a minor unit round half away from zero. Returns `None` if the
/// amount does not fit an `i64` once scaled.
pub fn major_to_minor(amount: Decimal, currency: &Currency) -> Option<i64> {
    let scale = 10_i64.checked_pow(currency.exponent)?;

    round_minor(amount.checked_mul(Decimal::from(scale))?).ok()
}
