//! Quotes
//!
//! A quote is the base fare for a trip before any discount. Up to four
//! passengers travel in a private car, five to seven in a van; larger groups
//! need a manual quotation.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, iso::Currency};

use crate::rates::{RateError, fraction, round_minor};

/// Largest party a private car carries.
pub const CAR_MAX_PASSENGERS: u32 = 4;

/// Largest party a passenger van carries.
pub const VAN_MAX_PASSENGERS: u32 = 7;

/// Vehicle suggested for a party size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleClass {
    /// Private car, up to four passengers
    PrivateCar,

    /// Passenger van, five to seven passengers
    PassengerVan,

    /// Larger parties, priced on request
    OnRequest,
}

impl VehicleClass {
    /// Vehicle class for a party size, `None` for an empty party.
    pub const fn for_passengers(passengers: u32) -> Option<Self> {
        match passengers {
            0 => None,
            1..=CAR_MAX_PASSENGERS => Some(VehicleClass::PrivateCar),
            5..=VAN_MAX_PASSENGERS => Some(VehicleClass::PassengerVan),
            _ => Some(VehicleClass::OnRequest),
        }
    }

    /// Passengers included in the base fare of this class.
    const fn included_passengers(self) -> u32 {
        match self {
            VehicleClass::PrivateCar => 1,
            VehicleClass::PassengerVan => 5,
            VehicleClass::OnRequest => 0,
        }
    }

    /// Customer-facing label, as sent by the quote service.
    pub const fn label(self) -> &'static str {
        match self {
            VehicleClass::PrivateCar => "Auto Privado",
            VehicleClass::PassengerVan => "Van de Pasajeros",
            VehicleClass::OnRequest => "Consultar disponibilidad",
        }
    }

    /// Parse a label sent by the quote service.
    pub fn from_label(label: &str) -> Option<Self> {
        [
            VehicleClass::PrivateCar,
            VehicleClass::PassengerVan,
            VehicleClass::OnRequest,
        ]
        .into_iter()
        .find(|class| class.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fare for one vehicle class to one destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleFare<'a> {
    /// Fare covering the passengers included in the class
    pub base: Money<'a, Currency>,

    /// Surcharge per additional passenger, as a fraction of the base fare
    pub additional_passenger: Percentage,
}

impl<'a> VehicleFare<'a> {
    /// Create a fare.
    pub fn new(base: Money<'a, Currency>, additional_passenger: Percentage) -> Self {
        Self {
            base,
            additional_passenger,
        }
    }

    /// Fare for `additional` passengers beyond those included.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::PercentConversion`] if the fare overflows.
    pub fn price_for(&self, additional: u32) -> Result<Money<'a, Currency>, RateError> {
        let base = Decimal::from_i64(self.base.to_minor_units()).ok_or(RateError::PercentConversion)?;

        let surcharge = base
            .checked_mul(fraction(self.additional_passenger))
            .and_then(|per_passenger| per_passenger.checked_mul(Decimal::from(additional)))
            .ok_or(RateError::PercentConversion)?;

        let total = base
            .checked_add(surcharge)
            .ok_or(RateError::PercentConversion)?;

        Ok(Money::from_minor(round_minor(total)?, self.base.currency()))
    }
}

/// Fare table for one destination.
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationFares<'a> {
    /// Destination name
    pub name: String,

    /// Private car fare, if the destination is served by car
    pub car: Option<VehicleFare<'a>>,

    /// Passenger van fare, if the destination is served by van
    pub van: Option<VehicleFare<'a>>,
}

impl<'a> DestinationFares<'a> {
    /// Create a fare table without any fares.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            car: None,
            van: None,
        }
    }

    /// Set the private car fare.
    #[must_use]
    pub fn with_car(mut self, fare: VehicleFare<'a>) -> Self {
        self.car = Some(fare);
        self
    }

    /// Set the passenger van fare.
    #[must_use]
    pub fn with_van(mut self, fare: VehicleFare<'a>) -> Self {
        self.van = Some(fare);
        self
    }

    /// Fare for a vehicle class.
    pub fn fare(&self, class: VehicleClass) -> Option<&VehicleFare<'a>> {
        match class {
            VehicleClass::PrivateCar => self.car.as_ref(),
            VehicleClass::PassengerVan => self.van.as_ref(),
            VehicleClass::OnRequest => None,
        }
    }
}

/// Base fare for a trip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote<'a> {
    base_price: Option<Money<'a, Currency>>,
    vehicle: Option<VehicleClass>,
}

impl<'a> Quote<'a> {
    /// Create a quote.
    pub fn new(base_price: Option<Money<'a, Currency>>, vehicle: Option<VehicleClass>) -> Self {
        Self {
            base_price,
            vehicle,
        }
    }

    /// A priced quote.
    pub fn priced(base_price: Money<'a, Currency>, vehicle: Option<VehicleClass>) -> Self {
        Self::new(Some(base_price), vehicle)
    }

    /// A quote that needs manual confirmation.
    pub fn pending(vehicle: Option<VehicleClass>) -> Self {
        Self::new(None, vehicle)
    }

    /// Base fare, `None` while the quotation is pending
    pub fn base_price(&self) -> Option<Money<'a, Currency>> {
        self.base_price
    }

    /// Suggested vehicle
    pub fn vehicle(&self) -> Option<VehicleClass> {
        self.vehicle
    }

    /// Whether a base fare is known.
    pub fn is_priced(&self) -> bool {
        self.base_price.is_some()
    }
}

/// Quote a trip for a party size.
///
/// `destination` is `None` for destinations outside the fare table, which are
/// always quoted manually.
///
/// # Errors
///
/// Returns [`RateError::PercentConversion`] if the fare overflows.
pub fn quote<'a>(
    destination: Option<&DestinationFares<'a>>,
    passengers: u32,
) -> Result<Quote<'a>, RateError> {
    let Some(destination) = destination else {
        return Ok(Quote::pending(None));
    };

    let Some(class) = VehicleClass::for_passengers(passengers) else {
        return Ok(Quote::pending(None));
    };

    let Some(fare) = destination.fare(class) else {
        return Ok(Quote::pending(Some(class)));
    };

    let additional = passengers.saturating_sub(class.included_passengers());

    Ok(Quote::priced(fare.price_for(additional)?, Some(class)))
}
