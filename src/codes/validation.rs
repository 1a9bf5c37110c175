//! Discount Code Validation
//!
//! Redeeming a code checks, in order: existence, usage limit, expiry, prior use
//! by the same customer, destination and minimum spend. The first failing check
//! is reported.

use jiff::civil::Date;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::debug;

use crate::codes::DiscountCode;

/// Reasons a code cannot be redeemed.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CodeRejection {
    /// Unknown or deactivated code.
    #[error("discount code not found")]
    NotFound,

    /// Usage limit reached.
    #[error("discount code usage limit reached")]
    UsageExhausted,

    /// Past its expiry date.
    #[error("discount code expired")]
    Expired,

    /// Customer already redeemed this code.
    #[error("discount code already used by this customer")]
    AlreadyUsed,

    /// Code restricted to other destinations.
    #[error("discount code not applicable to this destination")]
    DestinationNotApplicable,

    /// Booking amount below the code's minimum spend.
    #[error("booking amount below the code's minimum")]
    MinAmountNotMet,
}

impl CodeRejection {
    /// Reason string used by the discount-code service.
    pub const fn reason(self) -> &'static str {
        match self {
            CodeRejection::NotFound => "not_found",
            CodeRejection::UsageExhausted => "usage_exhausted",
            CodeRejection::Expired => "expired",
            CodeRejection::AlreadyUsed => "already_used",
            CodeRejection::DestinationNotApplicable => "destination_not_applicable",
            CodeRejection::MinAmountNotMet => "min_amount_not_met",
        }
    }

    /// Parse a discount-code service reason string.
    pub fn from_reason(reason: &str) -> Option<Self> {
        match reason.trim() {
            "not_found" => Some(CodeRejection::NotFound),
            "usage_exhausted" => Some(CodeRejection::UsageExhausted),
            "expired" => Some(CodeRejection::Expired),
            "already_used" => Some(CodeRejection::AlreadyUsed),
            "destination_not_applicable" => Some(CodeRejection::DestinationNotApplicable),
            "min_amount_not_met" => Some(CodeRejection::MinAmountNotMet),
            _ => None,
        }
    }
}

/// A stored discount code together with its redemption constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeRecord<'a> {
    /// The code as it is applied once validated
    pub code: DiscountCode<'a>,

    /// Deactivated codes are treated as unknown
    pub active: bool,

    /// Maximum number of redemptions
    pub usage_limit: u32,

    /// Redemptions so far
    pub usage_count: u32,

    /// Destinations the code applies to; empty means every destination
    pub applicable_destinations: Vec<String>,

    /// Minimum booking amount
    pub minimum_amount: Option<Money<'a, Currency>>,

    /// Customers who already redeemed the code
    pub used_by: Vec<String>,
}

impl<'a> CodeRecord<'a> {
    /// Create an active record with the given usage limit and no other restrictions.
    pub fn new(code: DiscountCode<'a>, usage_limit: u32) -> Self {
        Self {
            code,
            active: true,
            usage_limit,
            usage_count: 0,
            applicable_destinations: Vec::new(),
            minimum_amount: None,
            used_by: Vec::new(),
        }
    }

    /// Whether the usage limit has been reached.
    pub fn is_exhausted(&self) -> bool {
        self.usage_count >= self.usage_limit
    }

    /// Whether the code applies to `destination`.
    pub fn applies_to(&self, destination: &str) -> bool {
        self.applicable_destinations.is_empty()
            || self
                .applicable_destinations
                .iter()
                .any(|candidate| candidate == destination)
    }

    /// Whether `customer` already redeemed the code.
    pub fn used_by(&self, customer: &str) -> bool {
        self.used_by.iter().any(|used| used == customer)
    }
}

/// The booking a code is being redeemed against.
#[derive(Debug, Clone, Copy)]
pub struct Redemption<'r, 'a> {
    /// Trip destination
    pub destination: &'r str,

    /// Booking amount the minimum spend is checked against
    pub amount: Money<'a, Currency>,

    /// Stable customer identifier, when known
    pub customer: Option<&'r str>,

    /// Date of redemption
    pub today: Date,
}

/// Validate a code lookup against a booking.
///
/// `record` is `None` when the lookup found no code.
///
/// # Errors
///
/// Returns the first [`CodeRejection`] that applies.
pub fn validate<'c, 'a>(
    record: Option<&'c CodeRecord<'a>>,
    redemption: &Redemption<'_, '_>,
) -> Result<&'c DiscountCode<'a>, CodeRejection> {
    let record = record
        .filter(|record| record.active)
        .ok_or(CodeRejection::NotFound)?;

    let rejection = if record.is_exhausted() {
        Some(CodeRejection::UsageExhausted)
    } else if record.code.is_expired_on(redemption.today) {
        Some(CodeRejection::Expired)
    } else if redemption
        .customer
        .is_some_and(|customer| record.used_by(customer))
    {
        Some(CodeRejection::AlreadyUsed)
    } else if !record.applies_to(redemption.destination) {
        Some(CodeRejection::DestinationNotApplicable)
    } else if record.minimum_amount.is_some_and(|minimum| {
        minimum.currency() == redemption.amount.currency()
            && redemption.amount.to_minor_units() < minimum.to_minor_units()
    }) {
        Some(CodeRejection::MinAmountNotMet)
    } else {
        None
    };

    if let Some(rejection) = rejection {
        debug!(code = record.code.code(), reason = rejection.reason(), "discount code rejected");

        return Err(rejection);
    }

    Ok(&record.code)
}
