//! Service Payloads
//!
//! JSON answers from the quoting and discount-code services, decoded into
//! domain types. Prices and code values arrive as JSON numbers or numeric
//! strings depending on the service version, so both are accepted.

use jiff::{
    Timestamp,
    civil::{Date, DateTime},
    tz::TimeZone,
};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::{
    codes::{CodeDiscount, DiscountCode, validation::CodeRejection},
    config::major_to_minor,
    quotes::{Quote, VehicleClass},
    rates::percent_points,
};

/// Errors decoding service payloads.
#[derive(Debug, Error)]
pub enum WireError {
    /// Malformed JSON or unexpected shape
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A field holds a value outside its domain
    #[error("invalid {field}: {value}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Received value
        value: String,
    },

    /// Rejection reason not known to this client
    #[error("unknown rejection reason: {0}")]
    UnknownReason(String),
}

/// Answer of the quoting service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponse {
    /// Base fare in major units; zero, null or missing when quoted manually
    #[serde(default)]
    pub precio: Option<Value>,

    /// Suggested vehicle label
    #[serde(default)]
    pub vehiculo: Option<String>,
}

impl QuoteResponse {
    /// Decode a quoting service answer.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Json`] if the payload is not a quote object.
    pub fn from_json(json: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The quote this answer describes.
    ///
    /// Any price that is not a positive, representable amount means the trip
    /// is quoted manually. Unknown vehicle labels are dropped.
    pub fn into_quote<'a>(self, currency: &'a Currency) -> Quote<'a> {
        let vehicle = self
            .vehiculo
            .as_deref()
            .filter(|label| !label.trim().is_empty())
            .and_then(VehicleClass::from_label);

        let base_price = self
            .precio
            .as_ref()
            .and_then(decimal_value)
            .filter(|amount| *amount > Decimal::ZERO)
            .and_then(|amount| major_to_minor(amount, currency))
            .map(|minor| Money::from_minor(minor, currency));

        if base_price.is_none() {
            debug!(precio = ?self.precio, "quote without usable price; pricing manually");
        }

        Quote::new(base_price, vehicle)
    }
}

/// How a discount code reduces the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    /// Percentage off
    Porcentaje,

    /// Fixed amount off
    MontoFijo,
}

/// A discount code as sent by the discount-code service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodePayload {
    /// Code string
    pub codigo: String,

    /// Customer-facing description
    #[serde(default)]
    pub descripcion: Option<String>,

    /// Reduction kind
    pub tipo: CodeKind,

    /// Percent points or amount in major units
    pub valor: Value,

    /// Combinable with other discounts
    #[serde(default = "default_combinable")]
    pub combinable: bool,

    /// Replaces every other discount
    #[serde(default)]
    pub exclusivo: bool,

    /// Last redeemable day (`YYYY-MM-DD`, optionally followed by a time)
    #[serde(default)]
    pub fecha_vencimiento: Option<String>,
}

fn default_combinable() -> bool {
    true
}

/// Answer of the discount-code service: a redeemable code or a rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeServiceAnswer {
    /// Redeemable code
    Code(CodePayload),

    /// Rejection with its reason string
    Rejected {
        /// Reason string (e.g. `expired`)
        error: String,
    },
}

impl CodeServiceAnswer {
    /// Decode a discount-code service answer.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Json`] if the payload matches neither shape.
    pub fn from_json(json: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The redeemable code, or why it was rejected.
    ///
    /// # Errors
    ///
    /// - [`WireError::UnknownReason`]: the rejection reason is not recognized.
    /// - [`WireError::InvalidValue`]: the code value or expiry date is malformed.
    pub fn into_code(self, currency: &Currency) -> Result<Result<DiscountCode<'_>, CodeRejection>, WireError> {
        match self {
            CodeServiceAnswer::Rejected { error } => CodeRejection::from_reason(&error)
                .map(Err)
                .ok_or(WireError::UnknownReason(error)),
            CodeServiceAnswer::Code(payload) => payload.into_code(currency).map(Ok),
        }
    }
}

impl CodePayload {
    /// Convert the payload into a discount code.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidValue`] if the value is not a number, a
    /// percentage falls outside `0..=100`, a fixed amount is negative, or the
    /// expiry date is malformed.
    pub fn into_code(self, currency: &Currency) -> Result<DiscountCode<'_>, WireError> {
        let invalid_value = || WireError::InvalidValue {
            field: "valor",
            value: self.valor.to_string(),
        };

        let value = decimal_value(&self.valor).ok_or_else(invalid_value)?;

        let discount = match self.tipo {
            CodeKind::Porcentaje => {
                if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
                    return Err(invalid_value());
                }

                CodeDiscount::Percentage(percent_points(value))
            }
            CodeKind::MontoFijo => {
                if value < Decimal::ZERO {
                    return Err(invalid_value());
                }

                let minor = major_to_minor(value, currency).ok_or_else(invalid_value)?;

                CodeDiscount::FixedAmount(Money::from_minor(minor, currency))
            }
        };

        let mut code = DiscountCode::new(&self.codigo, discount)
            .combinable(self.combinable)
            .exclusive(self.exclusivo);

        if let Some(description) = self.descripcion {
            code = code.with_description(description);
        }

        if let Some(expiry) = self.fecha_vencimiento.as_deref() {
            code = code.expiring_on(parse_date(expiry)?);
        }

        Ok(code)
    }
}

/// A JSON number or numeric string as a decimal.
fn decimal_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(Decimal::from)
            .or_else(|| number.as_f64().and_then(Decimal::from_f64)),
        Value::String(text) => text.trim().parse::<Decimal>().ok(),
        _ => None,
    }
}

/// Accepts an RFC 3339 timestamp (taken in UTC), a civil datetime or a plain date.
fn parse_date(value: &str) -> Result<Date, WireError> {
    let trimmed = value.trim();

    trimmed
        .parse::<Timestamp>()
        .map(|timestamp| timestamp.to_zoned(TimeZone::UTC).date())
        .or_else(|_err| trimmed.parse::<DateTime>().map(|datetime| datetime.date()))
        .or_else(|_err| trimmed.parse::<Date>())
        .map_err(|_err| WireError::InvalidValue {
            field: "fechaVencimiento",
            value: value.to_string(),
        })
}
