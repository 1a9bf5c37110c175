//! Discount Codes
//!
//! A discount code is entered by the customer and resolved server-side into
//! either a percentage or a fixed amount. The kind decides where the code sits
//! in the order of operations: percentages join the bucket percentages before
//! the combined cap, fixed amounts are subtracted after it.

use decimal_percentage::Percentage;
use jiff::civil::Date;
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};

use crate::rates::fraction;

pub mod validation;

/// The reduction a discount code grants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CodeDiscount<'a> {
    /// Percentage off the base price (e.g., "20% off")
    Percentage(Percentage),

    /// Fixed amount off the discounted total (e.g., "$10.000 off")
    FixedAmount(Money<'a, Currency>),
}

/// A validated discount code.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountCode<'a> {
    code: String,
    description: String,
    discount: CodeDiscount<'a>,
    combinable: bool,
    exclusive: bool,
    expires_on: Option<Date>,
}

impl<'a> DiscountCode<'a> {
    /// Create a combinable, non-exclusive code without expiry.
    ///
    /// The code is stored trimmed and upper-cased for display.
    pub fn new(code: impl AsRef<str>, discount: CodeDiscount<'a>) -> Self {
        Self {
            code: normalize_code(code.as_ref()),
            description: String::new(),
            discount,
            combinable: true,
            exclusive: false,
            expires_on: None,
        }
    }

    /// Set the customer-facing description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the code as combinable (or not) with other discounts.
    #[must_use]
    pub fn combinable(mut self, combinable: bool) -> Self {
        self.combinable = combinable;
        self
    }

    /// Mark the code as exclusive: it replaces every other discount.
    #[must_use]
    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Set the last day the code can be redeemed.
    #[must_use]
    pub fn expiring_on(mut self, date: Date) -> Self {
        self.expires_on = Some(date);
        self
    }

    /// Normalized code string
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Customer-facing description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Reduction granted by the code
    pub fn discount(&self) -> CodeDiscount<'a> {
        self.discount
    }

    /// Whether the code may be shown as combinable with other discounts
    pub fn is_combinable(&self) -> bool {
        self.combinable
    }

    /// Whether the code replaces every other discount
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Last redeemable day, if any
    pub fn expires_on(&self) -> Option<Date> {
        self.expires_on
    }

    /// Whether the code can no longer be redeemed on `today`.
    ///
    /// A code stays valid through its expiry date.
    pub fn is_expired_on(&self, today: Date) -> bool {
        self.expires_on.is_some_and(|expires_on| expires_on < today)
    }

    /// Percent points this code adds to the combined percentage (0 for fixed amounts).
    pub fn percentage_points(&self) -> Decimal {
        match self.discount {
            CodeDiscount::Percentage(percent) => fraction(percent) * Decimal::ONE_HUNDRED,
            CodeDiscount::FixedAmount(_) => Decimal::ZERO,
        }
    }
}

/// Normalize user input the way codes are stored.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
