//! Discount Rates
//!
//! Every discount bucket is configured independently (online booking discount,
//! time-boxed promotion, return trip, customer segment) and reaches the composer
//! as a fraction in `[0, 1]`.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;
use tracing::warn;

/// Errors converting percentages into minor-unit amounts.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RateError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,
}

/// A discount category shown as its own line in a price breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Online booking discount
    Base,

    /// Promotion active for the trip's day or time window
    Promotion,

    /// Round-trip discount
    RoundTrip,

    /// Customer segment discount
    Personalized,

    /// Applied discount code
    Code,
}

impl Bucket {
    /// Buckets configured as rates, in display order.
    pub const RATES: [Bucket; 4] = [
        Bucket::Base,
        Bucket::Promotion,
        Bucket::RoundTrip,
        Bucket::Personalized,
    ];

    /// Buckets in display order, discount code last.
    pub const ALL: [Bucket; 5] = [
        Bucket::Base,
        Bucket::Promotion,
        Bucket::RoundTrip,
        Bucket::Personalized,
        Bucket::Code,
    ];

    /// Human-readable label for breakdowns.
    pub const fn label(self) -> &'static str {
        match self {
            Bucket::Base => "Online discount",
            Bucket::Promotion => "Promotion",
            Bucket::RoundTrip => "Round trip",
            Bucket::Personalized => "Personalized discount",
            Bucket::Code => "Discount code",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Discount rates for every configurable bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscountRates {
    /// Online booking discount
    pub base: Percentage,

    /// Active promotion
    pub promotion: Percentage,

    /// Round-trip discount, only honoured for round trips
    pub round_trip: Percentage,

    /// Customer segment discount
    pub personalized: Percentage,
}

impl Default for DiscountRates {
    fn default() -> Self {
        Self::none()
    }
}

impl DiscountRates {
    /// Create rates for every bucket.
    pub fn new(
        base: Percentage,
        promotion: Percentage,
        round_trip: Percentage,
        personalized: Percentage,
    ) -> Self {
        Self {
            base,
            promotion,
            round_trip,
            personalized,
        }
    }

    /// No discount in any bucket.
    pub fn none() -> Self {
        let zero = Percentage::from(Decimal::ZERO);

        Self::new(zero, zero, zero, zero)
    }

    /// Replace the online booking discount.
    #[must_use]
    pub fn with_base(mut self, rate: Percentage) -> Self {
        self.base = rate;
        self
    }

    /// Replace the promotion discount.
    #[must_use]
    pub fn with_promotion(mut self, rate: Percentage) -> Self {
        self.promotion = rate;
        self
    }

    /// Replace the round-trip discount.
    #[must_use]
    pub fn with_round_trip(mut self, rate: Percentage) -> Self {
        self.round_trip = rate;
        self
    }

    /// Replace the personalized discount.
    #[must_use]
    pub fn with_personalized(mut self, rate: Percentage) -> Self {
        self.personalized = rate;
        self
    }

    /// Rate configured for a bucket. The discount code is not a rate bucket.
    pub fn rate(&self, bucket: Bucket) -> Option<Percentage> {
        match bucket {
            Bucket::Base => Some(self.base),
            Bucket::Promotion => Some(self.promotion),
            Bucket::RoundTrip => Some(self.round_trip),
            Bucket::Personalized => Some(self.personalized),
            Bucket::Code => None,
        }
    }

    /// Copy of these rates with every bucket clamped into `[0, 1]`.
    ///
    /// Each clamped bucket is reported with a warning.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            base: clamp_rate(Bucket::Base, self.base),
            promotion: clamp_rate(Bucket::Promotion, self.promotion),
            round_trip: clamp_rate(Bucket::RoundTrip, self.round_trip),
            personalized: clamp_rate(Bucket::Personalized, self.personalized),
        }
    }

    /// Copy of these rates with the round-trip bucket zeroed.
    #[must_use]
    pub fn without_round_trip(self) -> Self {
        self.with_round_trip(Percentage::from(Decimal::ZERO))
    }

    /// Sum of every bucket as a fraction.
    pub fn sum(&self) -> Decimal {
        fraction(self.base)
            + fraction(self.promotion)
            + fraction(self.round_trip)
            + fraction(self.personalized)
    }
}

/// The fractional value of a percentage (0.25 for 25%).
pub fn fraction(percent: Percentage) -> Decimal {
    percent * Decimal::ONE // decimal_percentage doesn't expose the underlying Decimal
}

/// Build a percentage from percent points (25 for 25%).
pub fn percent_points(points: Decimal) -> Percentage {
    Percentage::from(points / Decimal::ONE_HUNDRED)
}

/// Shorthand for a percentage from whole percent points (`percent(15)` for 15%).
pub fn percent(points: i64) -> Percentage {
    percent_points(Decimal::from(points))
}

/// Clamp a rate into `[0, 1]`, warning when the configured value was out of range.
pub fn clamp_rate(bucket: Bucket, rate: Percentage) -> Percentage {
    let value = fraction(rate);

    if value < Decimal::ZERO {
        warn!(%bucket, rate = %value, "discount rate below zero; clamping to 0");

        Percentage::from(Decimal::ZERO)
    } else if value > Decimal::ONE {
        warn!(%bucket, rate = %value, "discount rate above one; clamping to 1");

        Percentage::from(Decimal::ONE)
    } else {
        rate
    }
}

/// Round a decimal amount to whole minor units, half away from zero.
///
/// # Errors
///
/// Returns [`RateError::PercentConversion`] if the rounded amount does not fit an `i64`.
pub fn round_minor(amount: Decimal) -> Result<i64, RateError> {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(RateError::PercentConversion)
}

/// Calculate a percentage of a minor unit amount, rounded to whole minor units.
///
/// # Errors
///
/// Returns [`RateError::PercentConversion`] if the calculation overflows.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, RateError> {
    let minor = Decimal::from_i64(minor).ok_or(RateError::PercentConversion)?;

    let applied = fraction(*percent)
        .checked_mul(minor)
        .ok_or(RateError::PercentConversion)?;

    round_minor(applied)
}

/// Calculate signed percent points of a minor unit amount, rounded to whole minor units.
///
/// Halves round toward positive infinity, so a -12.5 adjustment becomes -12.
///
/// # Errors
///
/// Returns [`RateError::PercentConversion`] if the calculation overflows.
pub fn points_of_minor(points: Decimal, minor: i64) -> Result<i64, RateError> {
    let minor = Decimal::from_i64(minor).ok_or(RateError::PercentConversion)?;

    let shifted = minor
        .checked_mul(points)
        .and_then(|value| value.checked_div(Decimal::ONE_HUNDRED))
        .and_then(|value| value.checked_add(Decimal::new(5, 1)))
        .ok_or(RateError::PercentConversion)?;

    shifted.floor().to_i64().ok_or(RateError::PercentConversion)
}
