//! Fare Composer prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    codes::{
        CodeDiscount, DiscountCode,
        validation::{CodeRecord, CodeRejection, Redemption, validate},
    },
    config::{ConfigError, PricingPolicy},
    deposit::Deposit,
    fixtures::{Fixture, FixtureError, ScenarioSet, scenarios::Scenario},
    pricing::{
        BucketAmounts, Pricing, PricingComposer, PricingError, PricingInput, PricingResult,
    },
    quotes::{DestinationFares, Quote, VehicleClass, VehicleFare, quote},
    rates::{Bucket, DiscountRates, RateError},
    return_trip::{ReturnDiscount, ReturnOption, ReturnTier, ReturnWindow, return_discount, return_options},
    summary::{PriceSummary, SummaryError},
    surcharges::{
        AppliedAdjustment, DynamicFare, FareRule, FareRuleKind, Holiday, SurchargeError,
        TripSchedule, evaluate,
    },
    wire::{CodeServiceAnswer, QuoteResponse, WireError},
};
