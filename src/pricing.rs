//! Pricing
//!
//! Composes a quoted base price, the configured discount buckets and an
//! optional discount code into the payable total and its deposit.
//!
//! Order of operations:
//!
//! 1. Bucket rates are clamped into `[0, 1]`. The round-trip bucket only counts
//!    for round trips, and an exclusive code zeroes every bucket.
//! 2. The bucket sum is rounded to whole percent points and a percentage code
//!    adds its points on top.
//! 3. The combined percentage is capped by the policy (75% by default) and
//!    taken off the base price.
//! 4. A fixed-amount code is subtracted from what is left, never going below zero.
//! 5. The deposit is a fraction (40% by default) of the payable total.
//!
//! Per-bucket amounts are independent display figures, each rounded on its own.
//! They are not reconciled against the capped total.

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    codes::{CodeDiscount, DiscountCode},
    config::PricingPolicy,
    deposit::Deposit,
    quotes::Quote,
    rates::{Bucket, DiscountRates, RateError, clamp_rate, fraction, percent_of_minor, percent_points},
};

/// Errors that can occur while composing a price.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// Percentage arithmetic could not be represented in minor units.
    #[error(transparent)]
    Rate(#[from] RateError),

    /// A fixed-amount discount code is denominated in another currency.
    #[error("currency mismatch: quoted in {expected}, discount code in {found}")]
    CurrencyMismatch {
        /// Quote currency
        expected: String,
        /// Discount code currency
        found: String,
    },
}

/// Everything a composition depends on.
#[derive(Debug, Clone, Copy)]
pub struct PricingInput<'q, 'a> {
    /// Quoted base price
    pub quote: &'q Quote<'a>,

    /// Configured bucket rates
    pub rates: DiscountRates,

    /// Whether the trip was booked as a round trip
    pub round_trip: bool,

    /// Validated discount code, if one was applied
    pub code: Option<&'q DiscountCode<'a>>,
}

impl<'q, 'a> PricingInput<'q, 'a> {
    /// One-way trip without a discount code.
    pub fn new(quote: &'q Quote<'a>, rates: DiscountRates) -> Self {
        Self {
            quote,
            rates,
            round_trip: false,
            code: None,
        }
    }

    /// Flag the trip as a round trip (or not).
    #[must_use]
    pub fn round_trip(mut self, round_trip: bool) -> Self {
        self.round_trip = round_trip;
        self
    }

    /// Apply a validated discount code.
    #[must_use]
    pub fn with_code(mut self, code: Option<&'q DiscountCode<'a>>) -> Self {
        self.code = code;
        self
    }
}

/// Discount amount shown for each bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketAmounts<'a> {
    /// Online booking discount
    pub base: Money<'a, Currency>,

    /// Promotion discount
    pub promotion: Money<'a, Currency>,

    /// Round-trip discount
    pub round_trip: Money<'a, Currency>,

    /// Personalized discount
    pub personalized: Money<'a, Currency>,

    /// Discount code
    pub code: Money<'a, Currency>,
}

impl<'a> BucketAmounts<'a> {
    /// Amount shown for a bucket.
    pub fn get(&self, bucket: Bucket) -> Money<'a, Currency> {
        match bucket {
            Bucket::Base => self.base,
            Bucket::Promotion => self.promotion,
            Bucket::RoundTrip => self.round_trip,
            Bucket::Personalized => self.personalized,
            Bucket::Code => self.code,
        }
    }

    /// Buckets with a non-zero amount, in display order.
    pub fn non_zero(&self) -> impl Iterator<Item = (Bucket, Money<'a, Currency>)> + '_ {
        Bucket::ALL
            .into_iter()
            .map(|bucket| (bucket, self.get(bucket)))
            .filter(|(_, amount)| amount.to_minor_units() != 0)
    }
}

/// A priced booking.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingResult<'a> {
    base_price: Money<'a, Currency>,
    amounts: BucketAmounts<'a>,
    requested_percentage: Decimal,
    combined_percentage: Decimal,
    total_discount: Money<'a, Currency>,
    total: Money<'a, Currency>,
    deposit: Deposit<'a>,
}

impl<'a> PricingResult<'a> {
    /// Quoted base price
    pub fn base_price(&self) -> Money<'a, Currency> {
        self.base_price
    }

    /// Per-bucket display amounts
    pub fn amounts(&self) -> &BucketAmounts<'a> {
        &self.amounts
    }

    /// Combined percent points before the cap
    pub fn requested_percentage(&self) -> Decimal {
        self.requested_percentage
    }

    /// Combined percent points actually applied
    pub fn combined_percentage(&self) -> Decimal {
        self.combined_percentage
    }

    /// Whether the combined discount hit the cap.
    pub fn is_capped(&self) -> bool {
        self.requested_percentage > self.combined_percentage
    }

    /// Base price minus the payable total
    pub fn total_discount(&self) -> Money<'a, Currency> {
        self.total_discount
    }

    /// Payable total (total con descuento)
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Deposit and remaining balance
    pub fn deposit(&self) -> &Deposit<'a> {
        &self.deposit
    }
}

/// Outcome of a composition.
#[derive(Debug, Clone, PartialEq)]
pub enum Pricing<'a> {
    /// No base price is known; the booking is priced manually.
    Unavailable,

    /// The booking was priced.
    Available(PricingResult<'a>),
}

impl<'a> Pricing<'a> {
    /// The priced result, if any.
    pub fn result(&self) -> Option<&PricingResult<'a>> {
        match self {
            Pricing::Unavailable => None,
            Pricing::Available(result) => Some(result),
        }
    }

    /// Whether a price could be composed.
    pub fn is_available(&self) -> bool {
        matches!(self, Pricing::Available(_))
    }

    /// Payable total, if priced.
    pub fn total(&self) -> Option<Money<'a, Currency>> {
        self.result().map(PricingResult::total)
    }

    /// Deposit amount, if priced.
    pub fn deposit(&self) -> Option<Money<'a, Currency>> {
        self.result().map(|result| result.deposit().amount())
    }
}

/// Composes prices under a [`PricingPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PricingComposer {
    policy: PricingPolicy,
}

impl PricingComposer {
    /// Create a composer for a policy.
    pub fn new(policy: PricingPolicy) -> Self {
        Self { policy }
    }

    /// Policy this composer applies
    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Compose the payable total, deposit and breakdown for a booking.
    ///
    /// A quote without a base price (or with a negative one) yields [`Pricing::Unavailable`].
    ///
    /// # Errors
    ///
    /// - [`PricingError::CurrencyMismatch`]: a fixed-amount code is in another currency.
    /// - [`PricingError::Rate`]: an amount overflowed its minor-unit representation.
    pub fn compose<'a>(&self, input: &PricingInput<'_, 'a>) -> Result<Pricing<'a>, PricingError> {
        let Some(base_price) = input.quote.base_price() else {
            debug!("no base price quoted; pricing unavailable");

            return Ok(Pricing::Unavailable);
        };

        let base_minor = base_price.to_minor_units();

        if base_minor < 0 {
            warn!(base_minor, "negative base price quoted; pricing unavailable");

            return Ok(Pricing::Unavailable);
        }

        let currency = base_price.currency();
        let rates = effective_rates(input);
        let code = input.code.map(|code| code_terms(code, currency)).transpose()?;

        let bucket_points = (rates.sum() * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        let code_points = code.map_or(Decimal::ZERO, |terms| terms.points);
        let requested_percentage = (bucket_points + code_points).normalize();
        let cap_points = fraction(self.policy.max_combined_discount) * Decimal::ONE_HUNDRED;
        let combined_percentage = requested_percentage.min(cap_points).normalize();

        let percentage_minor = percent_of_minor(&percent_points(combined_percentage), base_minor)?;
        let fixed_minor = code.map_or(0, |terms| terms.fixed_minor);

        let total_minor = base_minor
            .saturating_sub(percentage_minor)
            .saturating_sub(fixed_minor)
            .max(0);

        let money = |minor: i64| Money::from_minor(minor, currency);

        let code_display_minor = match code {
            Some(terms) if terms.fixed_minor > 0 => terms.fixed_minor.min(base_minor),
            Some(terms) => percent_of_minor(&percent_points(terms.points), base_minor)?,
            None => 0,
        };

        let amounts = BucketAmounts {
            base: money(percent_of_minor(&rates.base, base_minor)?),
            promotion: money(percent_of_minor(&rates.promotion, base_minor)?),
            round_trip: money(percent_of_minor(&rates.round_trip, base_minor)?),
            personalized: money(percent_of_minor(&rates.personalized, base_minor)?),
            code: money(code_display_minor),
        };

        let total = money(total_minor);
        let deposit = Deposit::split(total, self.policy.deposit_fraction)?;

        debug!(
            base_minor,
            %requested_percentage,
            %combined_percentage,
            fixed_minor,
            total_minor,
            "composed pricing"
        );

        Ok(Pricing::Available(PricingResult {
            base_price,
            amounts,
            requested_percentage,
            combined_percentage,
            total_discount: money(base_minor.saturating_sub(total_minor)),
            total,
            deposit,
        }))
    }
}

/// The part of a discount code the arithmetic needs.
#[derive(Debug, Clone, Copy)]
struct CodeTerms {
    /// Percent points added before the cap
    points: Decimal,

    /// Fixed amount subtracted after the percentage discount
    fixed_minor: i64,
}

fn code_terms(code: &DiscountCode<'_>, currency: &Currency) -> Result<CodeTerms, PricingError> {
    match code.discount() {
        CodeDiscount::Percentage(percent) => Ok(CodeTerms {
            points: fraction(clamp_rate(Bucket::Code, percent)) * Decimal::ONE_HUNDRED,
            fixed_minor: 0,
        }),
        CodeDiscount::FixedAmount(amount) => {
            if amount.currency() != currency {
                return Err(PricingError::CurrencyMismatch {
                    expected: currency.iso_alpha_code.to_string(),
                    found: amount.currency().iso_alpha_code.to_string(),
                });
            }

            let fixed_minor = amount.to_minor_units();

            if fixed_minor < 0 {
                warn!(code = code.code(), fixed_minor, "negative fixed-amount code ignored");
            }

            Ok(CodeTerms {
                points: Decimal::ZERO,
                fixed_minor: fixed_minor.max(0),
            })
        }
    }
}

/// Bucket rates that actually apply to this booking.
fn effective_rates(input: &PricingInput<'_, '_>) -> DiscountRates {
    if input.code.is_some_and(DiscountCode::is_exclusive) {
        return DiscountRates::none();
    }

    let rates = input.rates.clamped();

    if input.round_trip {
        rates
    } else {
        rates.without_round_trip()
    }
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use jiff::civil::date;
    use rusty_money::iso::{CLP, USD};
    use testresult::TestResult;

    use super::*;
    use crate::{quotes::VehicleClass, rates::percent};

    fn clp(minor: i64) -> Money<'static, Currency> {
        Money::from_minor(minor, CLP)
    }

    fn quote(minor: i64) -> Quote<'static> {
        Quote::priced(clp(minor), Some(VehicleClass::PrivateCar))
    }

    fn compose(input: &PricingInput<'_, 'static>) -> TestResult<PricingResult<'static>> {
        let pricing = PricingComposer::default().compose(input)?;

        pricing.result().cloned().ok_or_else(|| "pricing unavailable".into())
    }

    #[test]
    fn base_and_promotion_discount() -> TestResult {
        let quote = quote(100_000);
        let rates = DiscountRates::none()
            .with_base(percent(10))
            .with_promotion(percent(5));

        let result = compose(&PricingInput::new(&quote, rates))?;

        assert_eq!(result.combined_percentage(), Decimal::from(15));
        assert_eq!(result.total(), clp(85_000));
        assert_eq!(result.total_discount(), clp(15_000));
        assert_eq!(result.deposit().amount(), clp(34_000));
        assert_eq!(result.deposit().remainder(), clp(51_000));
        assert_eq!(result.amounts().base, clp(10_000));
        assert_eq!(result.amounts().promotion, clp(5_000));
        assert!(!result.is_capped());

        Ok(())
    }

    #[test]
    fn combined_discount_is_capped() -> TestResult {
        let quote = quote(100_000);
        let rates = DiscountRates::none()
            .with_base(percent(30))
            .with_promotion(percent(20))
            .with_personalized(percent(10));

        let code = DiscountCode::new("VEINTE", CodeDiscount::Percentage(percent(20)));
        let input = PricingInput::new(&quote, rates).with_code(Some(&code));
        let result = compose(&input)?;

        assert_eq!(result.requested_percentage(), Decimal::from(80));
        assert_eq!(result.combined_percentage(), Decimal::from(75));
        assert_eq!(result.total(), clp(25_000));
        assert_eq!(result.deposit().amount(), clp(10_000));
        assert!(result.is_capped());

        Ok(())
    }

    #[test]
    fn bucket_amounts_are_not_reconciled_with_the_cap() -> TestResult {
        let quote = quote(100_000);
        let rates = DiscountRates::none()
            .with_base(percent(50))
            .with_promotion(percent(40));

        let result = compose(&PricingInput::new(&quote, rates))?;

        assert_eq!(result.amounts().base, clp(50_000));
        assert_eq!(result.amounts().promotion, clp(40_000));
        assert_eq!(result.total_discount(), clp(75_000));

        Ok(())
    }

    #[test]
    fn fixed_amount_code_applies_after_percentage() -> TestResult {
        let quote = quote(100_000);
        let rates = DiscountRates::none()
            .with_base(percent(10))
            .with_promotion(percent(5));

        let code = DiscountCode::new("DIEZMIL", CodeDiscount::FixedAmount(clp(10_000)));
        let input = PricingInput::new(&quote, rates).with_code(Some(&code));
        let result = compose(&input)?;

        assert_eq!(result.combined_percentage(), Decimal::from(15));
        assert_eq!(result.total(), clp(75_000));
        assert_eq!(result.amounts().code, clp(10_000));
        assert_eq!(result.deposit().amount(), clp(30_000));

        Ok(())
    }

    #[test]
    fn fixed_amount_larger_than_remaining_total_floors_at_zero() -> TestResult {
        let quote = quote(20_000);
        let rates = DiscountRates::none().with_base(percent(50));
        let code = DiscountCode::new("GRANDE", CodeDiscount::FixedAmount(clp(50_000)));
        let input = PricingInput::new(&quote, rates).with_code(Some(&code));
        let result = compose(&input)?;

        assert_eq!(result.total(), clp(0));
        assert_eq!(result.deposit().amount(), clp(0));
        assert_eq!(result.amounts().code, clp(20_000));
        assert_eq!(result.total_discount(), clp(20_000));

        Ok(())
    }

    #[test]
    fn missing_base_price_is_unavailable() -> TestResult {
        let quote = Quote::pending(Some(VehicleClass::OnRequest));
        let pricing =
            PricingComposer::default().compose(&PricingInput::new(&quote, DiscountRates::none()))?;

        assert_eq!(pricing, Pricing::Unavailable);
        assert_eq!(pricing.total(), None);
        assert_eq!(pricing.deposit(), None);

        Ok(())
    }

    #[test]
    fn negative_base_price_is_unavailable() -> TestResult {
        let quote = quote(-1);
        let pricing =
            PricingComposer::default().compose(&PricingInput::new(&quote, DiscountRates::none()))?;

        assert!(!pricing.is_available());

        Ok(())
    }

    #[test]
    fn round_trip_rate_ignored_for_one_way_trips() -> TestResult {
        let quote = quote(100_000);
        let rates = DiscountRates::none()
            .with_base(percent(10))
            .with_round_trip(percent(20));

        let one_way = compose(&PricingInput::new(&quote, rates))?;
        let round_trip = compose(&PricingInput::new(&quote, rates).round_trip(true))?;

        assert_eq!(one_way.total(), clp(90_000));
        assert_eq!(one_way.amounts().round_trip, clp(0));
        assert_eq!(round_trip.total(), clp(70_000));
        assert_eq!(round_trip.amounts().round_trip, clp(20_000));

        Ok(())
    }

    #[test]
    fn exclusive_code_replaces_every_bucket() -> TestResult {
        let quote = quote(100_000);
        let rates = DiscountRates::none()
            .with_base(percent(10))
            .with_round_trip(percent(20))
            .with_personalized(percent(5));

        let code = DiscountCode::new("SOLO", CodeDiscount::Percentage(percent(30))).exclusive(true);
        let input = PricingInput::new(&quote, rates)
            .round_trip(true)
            .with_code(Some(&code));

        let result = compose(&input)?;

        assert_eq!(result.combined_percentage(), Decimal::from(30));
        assert_eq!(result.total(), clp(70_000));
        assert_eq!(result.amounts().non_zero().count(), 1);
        assert_eq!(result.amounts().code, clp(30_000));

        Ok(())
    }

    #[test]
    fn bucket_sum_is_rounded_to_whole_points_before_code() -> TestResult {
        let quote = quote(100_000);
        let rates = DiscountRates::none()
            .with_base(Percentage::from(Decimal::new(125, 3)))
            .with_promotion(Percentage::from(Decimal::new(2, 3)));

        let code = DiscountCode::new(
            "MEDIO",
            CodeDiscount::Percentage(Percentage::from(Decimal::new(25, 3))),
        );

        let input = PricingInput::new(&quote, rates).with_code(Some(&code));
        let result = compose(&input)?;

        // 12.7 points round to 13, the code adds 2.5 unrounded
        assert_eq!(result.combined_percentage(), Decimal::new(155, 1));
        assert_eq!(result.total(), clp(84_500));

        Ok(())
    }

    #[test]
    fn out_of_range_rates_are_clamped() -> TestResult {
        let quote = quote(100_000);
        let rates = DiscountRates::none()
            .with_base(percent(-20))
            .with_promotion(percent(10));

        let result = compose(&PricingInput::new(&quote, rates))?;

        assert_eq!(result.combined_percentage(), Decimal::from(10));
        assert_eq!(result.amounts().base, clp(0));
        assert_eq!(result.total(), clp(90_000));

        Ok(())
    }

    #[test]
    fn fixed_code_in_other_currency_is_rejected() {
        let quote = quote(100_000);
        let code = DiscountCode::new(
            "DOLAR",
            CodeDiscount::FixedAmount(Money::from_minor(1_000, USD)),
        );

        let input = PricingInput::new(&quote, DiscountRates::none()).with_code(Some(&code));
        let result = PricingComposer::default().compose(&input);

        assert!(matches!(
            result,
            Err(PricingError::CurrencyMismatch { expected, found }) if expected == "CLP" && found == "USD"
        ));
    }

    #[test]
    fn composing_twice_is_deterministic() -> TestResult {
        let quote = quote(123_457);
        let rates = DiscountRates::none()
            .with_base(percent(10))
            .with_promotion(percent(7));

        let code = DiscountCode::new("FIJO", CodeDiscount::FixedAmount(clp(3_333)))
            .expiring_on(date(2026, 12, 31));

        let input = PricingInput::new(&quote, rates).with_code(Some(&code));
        let composer = PricingComposer::default();

        assert_eq!(composer.compose(&input)?, composer.compose(&input)?);

        Ok(())
    }

    #[test]
    fn custom_policy_changes_cap_and_deposit() -> TestResult {
        let policy = PricingPolicy {
            max_combined_discount: percent(50),
            deposit_fraction: percent(25),
            ..PricingPolicy::default()
        };

        let quote = quote(100_000);
        let rates = DiscountRates::none()
            .with_base(percent(40))
            .with_promotion(percent(20));

        let pricing = PricingComposer::new(policy).compose(&PricingInput::new(&quote, rates))?;

        assert_eq!(pricing.total(), Some(clp(50_000)));
        assert_eq!(pricing.deposit(), Some(clp(12_500)));

        Ok(())
    }
}
