//! Dynamic Fares
//!
//! Rule-based adjustments to a quoted fare before any discount is composed.
//! Rules carry signed percent points: positive points are surcharges (late
//! bookings, night hours, holidays), negative points are discounts (booking well
//! in advance, quiet weekdays).

use std::{cmp::Reverse, fmt};

use jiff::civil::{Date, Time, Weekday};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::debug;

use crate::rates::{RateError, points_of_minor};

/// Errors that can occur while evaluating fare rules.
#[derive(Debug, Error)]
pub enum SurchargeError {
    /// Adjustment could not be represented in minor units.
    #[error(transparent)]
    Rate(#[from] RateError),

    /// Days in advance could not be computed.
    #[error("invalid trip date: {0}")]
    Date(#[from] jiff::Error),
}

/// Condition a fare rule matches on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FareRuleKind {
    /// Days between booking and trip within `min_days..=max_days` (open-ended without a maximum)
    Anticipation {
        /// Fewest days in advance
        min_days: i32,
        /// Most days in advance, if bounded
        max_days: Option<i32>,
    },

    /// Trip on one of the listed weekdays
    Weekday {
        /// Matching weekdays
        days: SmallVec<[Weekday; 7]>,
    },

    /// Trip time within `start..=end`; `start > end` wraps past midnight
    TimeWindow {
        /// Window start
        start: Time,
        /// Window end
        end: Time,
    },
}

/// What produced an applied adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustmentKind {
    /// Holiday surcharge
    Holiday,

    /// Booking anticipation
    Anticipation,

    /// Day of the week
    Weekday,

    /// Time of day
    TimeWindow,
}

impl AdjustmentKind {
    /// Short label for breakdowns.
    pub const fn label(self) -> &'static str {
        match self {
            AdjustmentKind::Holiday => "holiday",
            AdjustmentKind::Anticipation => "anticipation",
            AdjustmentKind::Weekday => "weekday",
            AdjustmentKind::TimeWindow => "time window",
        }
    }
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A configured dynamic fare rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareRule {
    /// Rule name
    pub name: String,

    /// Matching condition
    pub kind: FareRuleKind,

    /// Signed percent points added to the fare when the rule matches
    pub adjustment_points: Decimal,

    /// Higher priorities are evaluated first
    pub priority: i32,

    /// Inactive rules are never evaluated
    pub active: bool,

    /// Destinations the rule never applies to
    pub excluded_destinations: Vec<String>,

    /// Customer-facing description
    pub description: Option<String>,
}

impl FareRule {
    /// Create an active rule with priority zero and no exclusions.
    pub fn new(name: impl Into<String>, kind: FareRuleKind, adjustment_points: Decimal) -> Self {
        Self {
            name: name.into(),
            kind,
            adjustment_points,
            priority: 0,
            active: true,
            excluded_destinations: Vec::new(),
            description: None,
        }
    }

    /// Set the evaluation priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Activate or deactivate the rule.
    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Never apply the rule to a destination.
    #[must_use]
    pub fn excluding(mut self, destination: impl Into<String>) -> Self {
        self.excluded_destinations.push(destination.into());
        self
    }

    fn excludes(&self, destination: &str) -> bool {
        self.excluded_destinations
            .iter()
            .any(|excluded| excluded == destination)
    }

    /// Detail line when the rule matches the trip, `None` otherwise.
    fn matches(&self, trip: &TripSchedule, days_in_advance: i32) -> Option<String> {
        match &self.kind {
            FareRuleKind::Anticipation { min_days, max_days } => {
                let within = days_in_advance >= *min_days
                    && max_days.is_none_or(|max_days| days_in_advance <= max_days);

                within.then(|| match max_days {
                    Some(max_days) => format!("{min_days}-{max_days} days in advance"),
                    None => format!("{min_days}+ days in advance"),
                })
            }
            FareRuleKind::Weekday { days } => {
                let weekday = trip.date.weekday();

                days.contains(&weekday).then(|| weekday_name(weekday).to_string())
            }
            FareRuleKind::TimeWindow { start, end } => {
                let time = trip.time?;

                in_window(time, *start, *end).then(|| {
                    format!(
                        "{:02}:{:02} - {:02}:{:02}",
                        start.hour(),
                        start.minute(),
                        end.hour(),
                        end.minute()
                    )
                })
            }
        }
    }

    fn adjustment_kind(&self) -> AdjustmentKind {
        match self.kind {
            FareRuleKind::Anticipation { .. } => AdjustmentKind::Anticipation,
            FareRuleKind::Weekday { .. } => AdjustmentKind::Weekday,
            FareRuleKind::TimeWindow { .. } => AdjustmentKind::TimeWindow,
        }
    }
}

/// A holiday or special date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    /// Holiday name
    pub name: String,

    /// Date of the holiday; only month and day matter when recurring
    pub date: Date,

    /// Whether the holiday repeats every year
    pub recurring: bool,

    /// Surcharge in percent points, if the holiday carries one
    pub surcharge_points: Option<Decimal>,

    /// Inactive holidays are ignored
    pub active: bool,
}

impl Holiday {
    /// Create an active, non-recurring holiday without surcharge.
    pub fn new(name: impl Into<String>, date: Date) -> Self {
        Self {
            name: name.into(),
            date,
            recurring: false,
            surcharge_points: None,
            active: true,
        }
    }

    /// Repeat the holiday every year.
    #[must_use]
    pub fn recurring(mut self, recurring: bool) -> Self {
        self.recurring = recurring;
        self
    }

    /// Set the surcharge in percent points.
    #[must_use]
    pub fn with_surcharge(mut self, points: Decimal) -> Self {
        self.surcharge_points = Some(points);
        self
    }

    /// Whether the holiday falls on a date.
    pub fn falls_on(&self, date: Date) -> bool {
        if self.recurring {
            self.date.month() == date.month() && self.date.day() == date.day()
        } else {
            self.date == date
        }
    }
}

/// When and where a trip happens, and when it was booked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSchedule {
    /// Destination name
    pub destination: String,

    /// Trip date
    pub date: Date,

    /// Pickup time, if known
    pub time: Option<Time>,

    /// Booking date
    pub booked_on: Date,
}

/// One adjustment that contributed to a dynamic fare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedAdjustment {
    /// Rule or holiday name
    pub name: String,

    /// What produced the adjustment
    pub kind: AdjustmentKind,

    /// Signed percent points
    pub points: Decimal,

    /// Why the adjustment matched
    pub detail: String,

    /// Customer-facing description
    pub description: Option<String>,
}

/// A fare after dynamic adjustments.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicFare<'a> {
    /// Fare before adjustments
    pub base_price: Money<'a, Currency>,

    /// Sum of applied percent points
    pub total_points: Decimal,

    /// Signed adjustment amount
    pub adjustment: Money<'a, Currency>,

    /// Adjusted fare, never below zero
    pub final_price: Money<'a, Currency>,

    /// Whole days between booking and trip
    pub days_in_advance: i32,

    /// Adjustments in evaluation order
    pub applied: Vec<AppliedAdjustment>,
}

/// Apply holidays and fare rules to a base fare.
///
/// The first active holiday on the trip date is applied before any rule. Rules
/// are then evaluated by descending priority.
///
/// # Errors
///
/// - [`SurchargeError::Date`]: the days between booking and trip could not be computed.
/// - [`SurchargeError::Rate`]: the adjustment overflowed its minor-unit representation.
pub fn evaluate<'a>(
    base_price: Money<'a, Currency>,
    trip: &TripSchedule,
    rules: &[FareRule],
    holidays: &[Holiday],
) -> Result<DynamicFare<'a>, SurchargeError> {
    let days_in_advance = trip.booked_on.until(trip.date)?.get_days();

    let mut applied = Vec::new();

    let holiday_surcharge = holidays
        .iter()
        .find(|holiday| holiday.active && holiday.falls_on(trip.date))
        .and_then(|holiday| {
            holiday
                .surcharge_points
                .filter(|points| !points.is_zero())
                .map(|points| (holiday, points))
        });

    if let Some((holiday, points)) = holiday_surcharge {
        applied.push(AppliedAdjustment {
            name: format!("Holiday: {}", holiday.name),
            kind: AdjustmentKind::Holiday,
            points,
            detail: holiday.name.clone(),
            description: None,
        });
    }

    let mut active: Vec<&FareRule> = rules.iter().filter(|rule| rule.active).collect();

    active.sort_by_key(|rule| Reverse(rule.priority));

    for rule in active {
        if rule.excludes(&trip.destination) {
            debug!(rule = %rule.name, destination = %trip.destination, "fare rule excluded for destination");

            continue;
        }

        if let Some(detail) = rule.matches(trip, days_in_advance) {
            applied.push(AppliedAdjustment {
                name: rule.name.clone(),
                kind: rule.adjustment_kind(),
                points: rule.adjustment_points,
                detail,
                description: rule.description.clone(),
            });
        }
    }

    let total_points: Decimal = applied.iter().map(|adjustment| adjustment.points).sum();

    let base_minor = base_price.to_minor_units();
    let adjustment_minor = points_of_minor(total_points, base_minor)?;

    let final_minor = base_minor
        .checked_add(adjustment_minor)
        .ok_or(RateError::PercentConversion)?
        .max(0);

    debug!(
        base_minor,
        %total_points,
        adjustment_minor,
        final_minor,
        days_in_advance,
        "dynamic fare evaluated"
    );

    let currency = base_price.currency();

    Ok(DynamicFare {
        base_price,
        total_points,
        adjustment: Money::from_minor(adjustment_minor, currency),
        final_price: Money::from_minor(final_minor, currency),
        days_in_advance,
        applied,
    })
}

/// Inclusive, minute-resolution window check; `start > end` wraps past midnight.
fn in_window(time: Time, start: Time, end: Time) -> bool {
    let at = (time.hour(), time.minute());
    let start = (start.hour(), start.minute());
    let end = (end.hour(), end.minute());

    if start <= end {
        start <= at && at <= end
    } else {
        at >= start || at <= end
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Monday => "Monday",
        Weekday::Tuesday => "Tuesday",
        Weekday::Wednesday => "Wednesday",
        Weekday::Thursday => "Thursday",
        Weekday::Friday => "Friday",
        Weekday::Saturday => "Saturday",
        Weekday::Sunday => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::{date, time};
    use rusty_money::iso::CLP;
    use smallvec::smallvec;
    use testresult::TestResult;

    use super::*;

    fn trip(date: Date, time: Option<Time>) -> TripSchedule {
        TripSchedule {
            destination: "Pucon".to_string(),
            date,
            time,
            booked_on: jiff::civil::date(2026, 3, 1),
        }
    }

    fn night() -> FareRule {
        FareRule::new(
            "Night",
            FareRuleKind::TimeWindow {
                start: time(22, 0, 0, 0),
                end: time(6, 0, 0, 0),
            },
            Decimal::from(20),
        )
    }

    #[test]
    fn no_rules_keeps_base_price() -> TestResult {
        let fare = evaluate(
            Money::from_minor(50_000, CLP),
            &trip(date(2026, 3, 10), None),
            &[],
            &[],
        )?;

        assert_eq!(fare.final_price, Money::from_minor(50_000, CLP));
        assert_eq!(fare.days_in_advance, 9);
        assert!(fare.applied.is_empty());

        Ok(())
    }

    #[test]
    fn negative_half_minor_unit_rounds_up() -> TestResult {
        let rule = FareRule::new(
            "Early bird",
            FareRuleKind::Anticipation {
                min_days: 0,
                max_days: None,
            },
            Decimal::from(-10),
        );

        let fare = evaluate(
            Money::from_minor(25, CLP),
            &trip(date(2026, 3, 10), None),
            &[rule],
            &[],
        )?;

        assert_eq!(fare.adjustment, Money::from_minor(-2, CLP));
        assert_eq!(fare.final_price, Money::from_minor(23, CLP));

        Ok(())
    }

    #[test]
    fn time_window_wraps_past_midnight() -> TestResult {
        let base = Money::from_minor(50_000, CLP);
        let rules = [night()];

        let late = evaluate(base, &trip(date(2026, 3, 10), Some(time(23, 30, 0, 0))), &rules, &[])?;
        let early = evaluate(base, &trip(date(2026, 3, 10), Some(time(6, 0, 59, 0))), &rules, &[])?;
        let day = evaluate(base, &trip(date(2026, 3, 10), Some(time(6, 1, 0, 0))), &rules, &[])?;
        let unknown = evaluate(base, &trip(date(2026, 3, 10), None), &rules, &[])?;

        assert_eq!(late.final_price, Money::from_minor(60_000, CLP));
        assert_eq!(early.final_price, Money::from_minor(60_000, CLP));
        assert_eq!(day.final_price, base);
        assert_eq!(unknown.final_price, base);

        Ok(())
    }

    #[test]
    fn anticipation_discount_with_open_maximum() -> TestResult {
        let rule = FareRule::new(
            "Early bird",
            FareRuleKind::Anticipation {
                min_days: 14,
                max_days: None,
            },
            Decimal::from(-10),
        );

        let fare = evaluate(
            Money::from_minor(40_000, CLP),
            &trip(date(2026, 3, 20), None),
            &[rule],
            &[],
        )?;

        assert_eq!(fare.days_in_advance, 19);
        assert_eq!(fare.adjustment, Money::from_minor(-4_000, CLP));
        assert_eq!(fare.final_price, Money::from_minor(36_000, CLP));
        assert_eq!(
            fare.applied.first().map(|applied| applied.detail.as_str()),
            Some("14+ days in advance")
        );

        Ok(())
    }

    #[test]
    fn weekday_rule_matches_listed_days() -> TestResult {
        let rule = FareRule::new(
            "Weekend",
            FareRuleKind::Weekday {
                days: smallvec![Weekday::Saturday, Weekday::Sunday],
            },
            Decimal::from(15),
        );

        // 2026-03-14 is a Saturday
        let saturday = evaluate(
            Money::from_minor(20_000, CLP),
            &trip(date(2026, 3, 14), None),
            std::slice::from_ref(&rule),
            &[],
        )?;
        let monday = evaluate(
            Money::from_minor(20_000, CLP),
            &trip(date(2026, 3, 16), None),
            &[rule],
            &[],
        )?;

        assert_eq!(saturday.final_price, Money::from_minor(23_000, CLP));
        assert_eq!(monday.final_price, Money::from_minor(20_000, CLP));

        Ok(())
    }

    #[test]
    fn recurring_holiday_applies_first() -> TestResult {
        let holidays = [Holiday::new("Fiestas Patrias", date(2020, 9, 18))
            .recurring(true)
            .with_surcharge(Decimal::from(25))];

        let rules = [night().with_priority(5)];

        let fare = evaluate(
            Money::from_minor(100_000, CLP),
            &TripSchedule {
                destination: "Pucon".to_string(),
                date: date(2026, 9, 18),
                time: Some(time(23, 0, 0, 0)),
                booked_on: date(2026, 9, 1),
            },
            &rules,
            &holidays,
        )?;

        let kinds: Vec<AdjustmentKind> = fare.applied.iter().map(|applied| applied.kind).collect();

        assert_eq!(kinds, vec![AdjustmentKind::Holiday, AdjustmentKind::TimeWindow]);
        assert_eq!(fare.total_points, Decimal::from(45));
        assert_eq!(fare.final_price, Money::from_minor(145_000, CLP));

        Ok(())
    }

    #[test]
    fn non_recurring_holiday_only_matches_its_year() {
        let holiday = Holiday::new("Census", date(2024, 4, 19));

        assert!(holiday.falls_on(date(2024, 4, 19)));
        assert!(!holiday.falls_on(date(2026, 4, 19)));
    }

    #[test]
    fn excluded_destination_and_inactive_rules_are_skipped() -> TestResult {
        let rules = [
            night().excluding("Pucon"),
            FareRule::new(
                "Disabled",
                FareRuleKind::Anticipation {
                    min_days: 0,
                    max_days: None,
                },
                Decimal::from(50),
            )
            .active(false),
        ];

        let fare = evaluate(
            Money::from_minor(30_000, CLP),
            &trip(date(2026, 3, 10), Some(time(23, 0, 0, 0))),
            &rules,
            &[],
        )?;

        assert!(fare.applied.is_empty());
        assert_eq!(fare.final_price, Money::from_minor(30_000, CLP));

        Ok(())
    }

    #[test]
    fn rules_are_recorded_by_descending_priority() -> TestResult {
        let rules = [
            FareRule::new(
                "Low",
                FareRuleKind::Anticipation {
                    min_days: 0,
                    max_days: Some(30),
                },
                Decimal::from(5),
            )
            .with_priority(1),
            night().with_priority(10),
        ];

        let fare = evaluate(
            Money::from_minor(10_000, CLP),
            &trip(date(2026, 3, 10), Some(time(22, 0, 0, 0))),
            &rules,
            &[],
        )?;

        let names: Vec<&str> = fare.applied.iter().map(|applied| applied.name.as_str()).collect();

        assert_eq!(names, vec!["Night", "Low"]);

        Ok(())
    }

    #[test]
    fn final_price_never_goes_negative() -> TestResult {
        let rule = FareRule::new(
            "Clearance",
            FareRuleKind::Anticipation {
                min_days: 0,
                max_days: None,
            },
            Decimal::from(-150),
        );

        let fare = evaluate(
            Money::from_minor(10_000, CLP),
            &trip(date(2026, 3, 10), None),
            &[rule],
            &[],
        )?;

        assert_eq!(fare.final_price, Money::from_minor(0, CLP));

        Ok(())
    }
}
