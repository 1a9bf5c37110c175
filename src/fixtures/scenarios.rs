//! Scenario Fixtures

use decimal_percentage::Percentage;
use jiff::civil::Date;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use tracing::debug;

use crate::{
    codes::{CodeDiscount, DiscountCode},
    config::{PolicyFixture, parse_percentage, parse_price},
    fixtures::FixtureError,
    quotes::{Quote, VehicleClass},
    rates::{DiscountRates, fraction},
};

/// Wrapper for scenarios in YAML
#[derive(Debug, Deserialize)]
pub struct ScenariosFixture {
    /// Pricing policy shared by every scenario
    #[serde(default)]
    pub policy: PolicyFixture,

    /// Map of scenario name -> scenario
    pub scenarios: FxHashMap<String, ScenarioFixture>,
}

/// A booking to price, as written in YAML
#[derive(Debug, Deserialize)]
pub struct ScenarioFixture {
    /// Quoted base price (e.g., "100000 CLP"); omitted for manual quotes
    #[serde(default)]
    pub base_price: Option<String>,

    /// Vehicle label (e.g., "Auto Privado")
    #[serde(default)]
    pub vehicle: Option<String>,

    /// Booked as a round trip
    #[serde(default)]
    pub round_trip: bool,

    /// Bucket rates
    #[serde(default)]
    pub rates: RatesFixture,

    /// Applied discount code
    #[serde(default)]
    pub code: Option<CodeFixture>,

    /// Expected outcome
    #[serde(default)]
    pub expect: Option<ExpectationFixture>,
}

/// Bucket rates as percentage strings (e.g., "10%" or "0.10"); omitted buckets are zero
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RatesFixture {
    /// Online booking discount
    pub base: Option<String>,

    /// Promotion discount
    pub promotion: Option<String>,

    /// Round-trip discount
    pub round_trip: Option<String>,

    /// Personalized discount
    pub personalized: Option<String>,
}

/// Discount code kind in YAML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeTypeFixture {
    /// `value` is a percentage string
    Percentage,

    /// `value` is a price string
    FixedAmount,
}

/// Discount code as written in YAML
#[derive(Debug, Deserialize)]
pub struct CodeFixture {
    /// Code string
    pub code: String,

    /// Code kind
    #[serde(rename = "type")]
    pub kind: CodeTypeFixture,

    /// "20%" for percentage codes, "10000 CLP" for fixed amounts
    pub value: String,

    /// Description
    #[serde(default)]
    pub description: Option<String>,

    /// Replaces every other discount
    #[serde(default)]
    pub exclusive: bool,

    /// Combinable with other discounts
    #[serde(default = "default_true")]
    pub combinable: bool,

    /// Last redeemable day
    #[serde(default)]
    pub expires_on: Option<Date>,
}

/// Expected outcome as written in YAML
#[derive(Debug, Deserialize)]
pub struct ExpectationFixture {
    /// Whether a price can be composed
    #[serde(default = "default_true")]
    pub available: bool,

    /// Applied combined percentage (e.g., "75%")
    #[serde(default)]
    pub combined: Option<String>,

    /// Whether the combined discount hit the cap
    #[serde(default)]
    pub capped: Option<bool>,

    /// Payable total (e.g., "85000 CLP")
    #[serde(default)]
    pub total: Option<String>,

    /// Deposit (e.g., "34000 CLP")
    #[serde(default)]
    pub deposit: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A booking to price.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Quoted base fare
    pub quote: Quote<'static>,

    /// Bucket rates
    pub rates: DiscountRates,

    /// Booked as a round trip
    pub round_trip: bool,

    /// Applied discount code
    pub code: Option<DiscountCode<'static>>,

    /// Expected outcome, if the fixture states one
    pub expect: Option<Expectation>,
}

/// Expected outcome of pricing a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    /// Whether a price can be composed
    pub available: bool,

    /// Applied combined percent points
    pub combined_percentage: Option<Decimal>,

    /// Whether the combined discount hit the cap
    pub capped: Option<bool>,

    /// Payable total
    pub total: Option<Money<'static, Currency>>,

    /// Deposit
    pub deposit: Option<Money<'static, Currency>>,
}

impl ScenarioFixture {
    /// Convert into a scenario quoted in `currency`.
    ///
    /// # Errors
    ///
    /// Returns an error if a price, percentage or currency is invalid.
    pub fn into_scenario(self, currency: &'static Currency) -> Result<Scenario, FixtureError> {
        let vehicle = self.vehicle.as_deref().and_then(VehicleClass::from_label);

        let base_price = self
            .base_price
            .as_deref()
            .map(|price| parse_money(price, currency))
            .transpose()?;

        let code = self
            .code
            .map(|code| code.into_code(currency))
            .transpose()?;

        let expect = self
            .expect
            .map(|expect| expect.into_expectation(currency))
            .transpose()?;

        Ok(Scenario {
            quote: Quote::new(base_price, vehicle),
            rates: self.rates.try_into()?,
            round_trip: self.round_trip,
            code,
            expect,
        })
    }
}

impl TryFrom<RatesFixture> for DiscountRates {
    type Error = FixtureError;

    fn try_from(fixture: RatesFixture) -> Result<Self, Self::Error> {
        let rate = |value: Option<String>| -> Result<Percentage, FixtureError> {
            Ok(value
                .as_deref()
                .map(parse_percentage)
                .transpose()?
                .unwrap_or_else(|| Percentage::from(Decimal::ZERO)))
        };

        Ok(DiscountRates::new(
            rate(fixture.base)?,
            rate(fixture.promotion)?,
            rate(fixture.round_trip)?,
            rate(fixture.personalized)?,
        ))
    }
}

impl CodeFixture {
    /// Fixed amounts keep their own currency; a mismatch surfaces when composing.
    fn into_code(self, currency: &'static Currency) -> Result<DiscountCode<'static>, FixtureError> {
        let discount = match self.kind {
            CodeTypeFixture::Percentage => CodeDiscount::Percentage(parse_percentage(&self.value)?),
            CodeTypeFixture::FixedAmount => {
                let (minor, code_currency) = parse_price(&self.value)?;

                if code_currency != currency {
                    debug!(
                        code = %self.code,
                        currency = code_currency.iso_alpha_code,
                        "fixed-amount code in another currency"
                    );
                }

                CodeDiscount::FixedAmount(Money::from_minor(minor, code_currency))
            }
        };

        let mut code = DiscountCode::new(&self.code, discount)
            .exclusive(self.exclusive)
            .combinable(self.combinable);

        if let Some(description) = self.description {
            code = code.with_description(description);
        }

        if let Some(expires_on) = self.expires_on {
            code = code.expiring_on(expires_on);
        }

        Ok(code)
    }
}

impl ExpectationFixture {
    fn into_expectation(self, currency: &'static Currency) -> Result<Expectation, FixtureError> {
        let combined_percentage = self
            .combined
            .as_deref()
            .map(parse_percentage)
            .transpose()?
            .map(|percent| (fraction(percent) * Decimal::ONE_HUNDRED).normalize());

        let money = |value: Option<String>| {
            value
                .as_deref()
                .map(|value| parse_money(value, currency))
                .transpose()
        };

        Ok(Expectation {
            available: self.available,
            combined_percentage,
            capped: self.capped,
            total: money(self.total)?,
            deposit: money(self.deposit)?,
        })
    }
}

/// Parse a price that must be in the fixture set's currency.
fn parse_money(value: &str, currency: &'static Currency) -> Result<Money<'static, Currency>, FixtureError> {
    let (minor, parsed_currency) = parse_price(value)?;

    if parsed_currency != currency {
        return Err(FixtureError::CurrencyMismatch(
            currency.iso_alpha_code.to_string(),
            parsed_currency.iso_alpha_code.to_string(),
        ));
    }

    Ok(Money::from_minor(minor, currency))
}
