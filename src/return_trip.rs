//! Return Trips
//!
//! A driver finishing a service can take a return booking from the same place.
//! The shorter the wait after the service ends, the larger the discount on the
//! return leg. The resulting rate feeds [`DiscountRates::round_trip`](crate::rates::DiscountRates).

use std::fmt;

use decimal_percentage::Percentage;
use jiff::{SignedDuration, civil::DateTime};
use rust_decimal::Decimal;

/// Tiered return discounts by minutes waited after the service ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnWindow {
    /// Exact wait that earns the maximum discount
    pub maximum_minutes: i64,

    /// Maximum discount
    pub maximum_rate: Percentage,

    /// Longest wait that earns the intermediate discount
    pub intermediate_minutes: i64,

    /// Intermediate discount
    pub intermediate_rate: Percentage,

    /// Longest wait that earns the basic discount
    pub basic_minutes: i64,

    /// Basic discount
    pub basic_rate: Percentage,
}

impl Default for ReturnWindow {
    fn default() -> Self {
        Self {
            maximum_minutes: 30,
            maximum_rate: Percentage::from(Decimal::new(50, 2)),
            intermediate_minutes: 45,
            intermediate_rate: Percentage::from(Decimal::new(30, 2)),
            basic_minutes: 60,
            basic_rate: Percentage::from(Decimal::new(20, 2)),
        }
    }
}

impl ReturnWindow {
    /// Tier for a wait in whole minutes.
    pub fn tier(&self, minutes: i64) -> ReturnTier {
        if minutes < self.maximum_minutes {
            ReturnTier::TooSoon
        } else if minutes == self.maximum_minutes {
            ReturnTier::Maximum
        } else if minutes <= self.intermediate_minutes {
            ReturnTier::Intermediate
        } else if minutes <= self.basic_minutes {
            ReturnTier::Basic
        } else {
            ReturnTier::NoDiscount
        }
    }

    /// Discount rate of a tier.
    pub fn rate(&self, tier: ReturnTier) -> Percentage {
        match tier {
            ReturnTier::Maximum => self.maximum_rate,
            ReturnTier::Intermediate => self.intermediate_rate,
            ReturnTier::Basic => self.basic_rate,
            ReturnTier::TooSoon | ReturnTier::NoDiscount => Percentage::from(Decimal::ZERO),
        }
    }
}

/// Return discount tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReturnTier {
    /// Departs before the driver can be back
    TooSoon,

    /// Departs exactly at the earliest slot
    Maximum,

    /// Departs within the intermediate window
    Intermediate,

    /// Departs within the basic window
    Basic,

    /// Departs too late for a return discount
    NoDiscount,
}

impl ReturnTier {
    /// Short label for breakdowns.
    pub const fn label(self) -> &'static str {
        match self {
            ReturnTier::TooSoon => "too soon",
            ReturnTier::Maximum => "maximum",
            ReturnTier::Intermediate => "intermediate",
            ReturnTier::Basic => "basic",
            ReturnTier::NoDiscount => "no discount",
        }
    }
}

impl fmt::Display for ReturnTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Return discount for a requested departure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnDiscount {
    /// Tier reached
    pub tier: ReturnTier,

    /// Minutes between the end of the service and the return departure
    pub minutes: i64,

    /// Discount rate of the tier
    pub rate: Percentage,
}

/// A suggested return departure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnOption {
    /// Tier of this departure
    pub tier: ReturnTier,

    /// Departure time
    pub departs_at: DateTime,

    /// Discount rate
    pub rate: Percentage,
}

/// Return discount for departing at `return_at` after a service ending at `service_end`.
///
/// The wait is rounded to the nearest minute, half a minute rounding up.
pub fn return_discount(
    window: &ReturnWindow,
    service_end: DateTime,
    return_at: DateTime,
) -> ReturnDiscount {
    let minutes = rounded_minutes(service_end.duration_until(return_at));
    let tier = window.tier(minutes);

    ReturnDiscount {
        tier,
        minutes,
        rate: window.rate(tier),
    }
}

/// The three discounted departures after a service ends, earliest first.
///
/// # Errors
///
/// Returns an error if a departure falls outside the supported date range.
pub fn return_options(
    window: &ReturnWindow,
    service_end: DateTime,
) -> Result<[ReturnOption; 3], jiff::Error> {
    let option = |tier: ReturnTier, minutes: i64| -> Result<ReturnOption, jiff::Error> {
        Ok(ReturnOption {
            tier,
            departs_at: service_end.checked_add(SignedDuration::from_mins(minutes))?,
            rate: window.rate(tier),
        })
    };

    Ok([
        option(ReturnTier::Maximum, window.maximum_minutes)?,
        option(ReturnTier::Intermediate, window.intermediate_minutes)?,
        option(ReturnTier::Basic, window.basic_minutes)?,
    ])
}

fn rounded_minutes(duration: SignedDuration) -> i64 {
    let minutes = (duration.as_millis() + 30_000).div_euclid(60_000);

    i64::try_from(minutes).unwrap_or(if minutes.is_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}
