//! Deposits

use decimal_percentage::Percentage;
use rusty_money::{Money, iso::Currency};

use crate::rates::{RateError, percent_of_minor};

/// Partial payment (abono) that holds a reservation, and the balance left to pay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deposit<'a> {
    amount: Money<'a, Currency>,
    remainder: Money<'a, Currency>,
    fraction: Percentage,
}

impl<'a> Deposit<'a> {
    /// Split a payable total into deposit and remaining balance.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::PercentConversion`] if the deposit cannot be represented in minor units.
    pub fn split(total: Money<'a, Currency>, fraction: Percentage) -> Result<Self, RateError> {
        let total_minor = total.to_minor_units().max(0);
        let amount_minor = percent_of_minor(&fraction, total_minor)?.clamp(0, total_minor);
        let remainder_minor = total_minor.saturating_sub(amount_minor);

        Ok(Self {
            amount: Money::from_minor(amount_minor, total.currency()),
            remainder: Money::from_minor(remainder_minor, total.currency()),
            fraction,
        })
    }

    /// Amount paid upfront
    pub fn amount(&self) -> Money<'a, Currency> {
        self.amount
    }

    /// Balance due after the deposit (saldo pendiente)
    pub fn remainder(&self) -> Money<'a, Currency> {
        self.remainder
    }

    /// Fraction of the total taken as deposit
    pub fn fraction(&self) -> Percentage {
        self.fraction
    }
}
