//! Fare Composer
//!
//! Fare Composer prices airport transfer bookings: it composes a quoted base fare,
//! independently configured discount buckets and an optional discount code into
//! the payable total and the deposit that holds the reservation.

pub mod codes;
pub mod config;
pub mod deposit;
pub mod fixtures;
pub mod prelude;
pub mod pricing;
pub mod quotes;
pub mod rates;
pub mod return_trip;
pub mod summary;
pub mod surcharges;
pub mod utils;
pub mod wire;
