// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Condition predicates and their text parser.
//!
//! Condition text is an *input format* only: it is parsed exactly once at
//! rule-creation time into a [`Predicate`], so evaluation never sees
//! malformed input and never re-parses on a tick.
//!
//! Accepted grammar (case-insensitive):
//! - `every N second(s)|minute(s)|hour(s)|day(s)|week(s)`, or bare
//!   `every minute|hour|day|week`
//! - `daily at HH:MM`
//! - `weekly on <weekday>`
//! - `monthly on <1..=31>`
//! - `price > X` / `price < X` (also `above` / `below`)
//! - `on event <type>` / `when <type> received`

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Error produced when condition text cannot be parsed. Names the
/// offending token so the caller can surface an actionable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty condition")]
    Empty,

    #[error("unrecognized condition `{0}`")]
    Unrecognized(String),

    #[error("invalid {what} `{token}`")]
    InvalidToken { what: &'static str, token: String },

    #[error("{what} `{token}` is out of range ({range})")]
    OutOfRange {
        what: &'static str,
        token: String,
        range: &'static str,
    },
}

/// Comparison operator for price conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceOp {
    Above,
    Below,
}

/// Day of the week for weekly conditions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Days since Monday, matching `chrono::Weekday::num_days_from_monday`.
    pub fn days_from_monday(self) -> u32 {
        match self {
            Weekday::Monday => 0,
            Weekday::Tuesday => 1,
            Weekday::Wednesday => 2,
            Weekday::Thursday => 3,
            Weekday::Friday => 4,
            Weekday::Saturday => 5,
            Weekday::Sunday => 6,
        }
    }
}

/// The parsed, typed form of a condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Predicate {
    /// Fires once per interval boundary relative to the rule's `created_at`.
    Periodic { interval_secs: u64 },
    /// Fires once per day at/after the given UTC wall-clock time.
    DailyAt { hour: u32, minute: u32 },
    /// Fires once per week at/after 00:00 UTC on the given weekday.
    WeeklyOn { weekday: Weekday },
    /// Fires once per month at/after 00:00 UTC on the given day of month
    /// (clamped to the month's length).
    MonthlyOn { day_of_month: u32 },
    /// Fires while the feed price is above/below the threshold.
    PriceThreshold { op: PriceOp, value: Decimal },
    /// Fires when a matching event has been observed since the last check.
    /// Each evaluation consumes at most one event.
    EventOccurred { event_type: String },
}

impl Predicate {
    /// Parse condition text into a predicate.
    ///
    /// Pure: no clock, feed, or store access. Rejects empty or
    /// unrecognized input with a [`ParseError`] naming the offending token.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let normalized = text.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(ParseError::Empty);
        }
        let tokens: Vec<&str> = normalized.split_whitespace().collect();

        match tokens.as_slice() {
            ["every", rest @ ..] => parse_periodic(rest, &normalized),
            ["daily", "at", time] => parse_daily(time),
            ["weekly", "on", day] => parse_weekday(day),
            ["monthly", "on", day] => parse_day_of_month(day),
            ["price", op, value] => parse_price(op, value),
            ["on", "event", event_type] => Ok(Predicate::EventOccurred {
                event_type: (*event_type).to_string(),
            }),
            ["when", event_type, "received"] => Ok(Predicate::EventOccurred {
                event_type: (*event_type).to_string(),
            }),
            _ => Err(ParseError::Unrecognized(normalized)),
        }
    }
}

/// Seconds per named unit, accepting singular and plural forms.
fn unit_secs(unit: &str) -> Option<u64> {
    match unit {
        "second" | "seconds" => Some(1),
        "minute" | "minutes" => Some(60),
        "hour" | "hours" => Some(3_600),
        "day" | "days" => Some(86_400),
        "week" | "weeks" => Some(604_800),
        _ => None,
    }
}

fn parse_periodic(rest: &[&str], original: &str) -> Result<Predicate, ParseError> {
    match rest {
        // "every hour"
        [unit] => {
            let secs = unit_secs(unit).ok_or_else(|| ParseError::InvalidToken {
                what: "interval unit",
                token: (*unit).to_string(),
            })?;
            Ok(Predicate::Periodic { interval_secs: secs })
        }
        // "every 5 minutes"
        [count, unit] => {
            let n: u64 = count.parse().map_err(|_| ParseError::InvalidToken {
                what: "interval count",
                token: (*count).to_string(),
            })?;
            if n == 0 {
                return Err(ParseError::OutOfRange {
                    what: "interval count",
                    token: (*count).to_string(),
                    range: "must be at least 1",
                });
            }
            let secs = unit_secs(unit).ok_or_else(|| ParseError::InvalidToken {
                what: "interval unit",
                token: (*unit).to_string(),
            })?;
            Ok(Predicate::Periodic { interval_secs: n * secs })
        }
        _ => Err(ParseError::Unrecognized(original.to_string())),
    }
}

fn parse_daily(time: &str) -> Result<Predicate, ParseError> {
    let invalid = || ParseError::InvalidToken {
        what: "time of day",
        token: time.to_string(),
    };
    let (hour_str, minute_str) = time.split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour_str.parse().map_err(|_| invalid())?;
    let minute: u32 = minute_str.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(ParseError::OutOfRange {
            what: "time of day",
            token: time.to_string(),
            range: "00:00..=23:59",
        });
    }
    Ok(Predicate::DailyAt { hour, minute })
}

fn parse_weekday(day: &str) -> Result<Predicate, ParseError> {
    let weekday = day.parse::<Weekday>().map_err(|_| ParseError::InvalidToken {
        what: "weekday",
        token: day.to_string(),
    })?;
    Ok(Predicate::WeeklyOn { weekday })
}

fn parse_day_of_month(day: &str) -> Result<Predicate, ParseError> {
    let day_of_month: u32 = day.parse().map_err(|_| ParseError::InvalidToken {
        what: "day of month",
        token: day.to_string(),
    })?;
    if !(1..=31).contains(&day_of_month) {
        return Err(ParseError::OutOfRange {
            what: "day of month",
            token: day.to_string(),
            range: "1..=31",
        });
    }
    Ok(Predicate::MonthlyOn { day_of_month })
}

fn parse_price(op: &str, value: &str) -> Result<Predicate, ParseError> {
    let op = match op {
        ">" | "above" => PriceOp::Above,
        "<" | "below" => PriceOp::Below,
        other => {
            return Err(ParseError::InvalidToken {
                what: "price operator",
                token: other.to_string(),
            });
        }
    };
    let value: Decimal = value.parse().map_err(|_| ParseError::InvalidToken {
        what: "price value",
        token: value.to_string(),
    })?;
    Ok(Predicate::PriceThreshold { op, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_periodic_forms() {
        assert_eq!(
            Predicate::parse("every hour").unwrap(),
            Predicate::Periodic { interval_secs: 3_600 }
        );
        assert_eq!(
            Predicate::parse("every 5 minutes").unwrap(),
            Predicate::Periodic { interval_secs: 300 }
        );
        assert_eq!(
            Predicate::parse("Every 2 Days").unwrap(),
            Predicate::Periodic { interval_secs: 172_800 }
        );
    }

    #[test]
    fn parses_calendar_forms() {
        assert_eq!(
            Predicate::parse("daily at 09:30").unwrap(),
            Predicate::DailyAt { hour: 9, minute: 30 }
        );
        assert_eq!(
            Predicate::parse("weekly on friday").unwrap(),
            Predicate::WeeklyOn { weekday: Weekday::Friday }
        );
        assert_eq!(
            Predicate::parse("monthly on 15").unwrap(),
            Predicate::MonthlyOn { day_of_month: 15 }
        );
    }

    #[test]
    fn parses_price_and_event_forms() {
        assert_eq!(
            Predicate::parse("price > 50000").unwrap(),
            Predicate::PriceThreshold { op: PriceOp::Above, value: dec!(50000) }
        );
        assert_eq!(
            Predicate::parse("price below 0.5").unwrap(),
            Predicate::PriceThreshold { op: PriceOp::Below, value: dec!(0.5) }
        );
        assert_eq!(
            Predicate::parse("on event transaction_received").unwrap(),
            Predicate::EventOccurred { event_type: "transaction_received".into() }
        );
        assert_eq!(
            Predicate::parse("when deposit received").unwrap(),
            Predicate::EventOccurred { event_type: "deposit".into() }
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(Predicate::parse(""), Err(ParseError::Empty));
        assert_eq!(Predicate::parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn rejects_unknown_input_naming_the_token() {
        let err = Predicate::parse("whenever convenient").unwrap_err();
        assert_eq!(err, ParseError::Unrecognized("whenever convenient".into()));

        let err = Predicate::parse("every fortnight").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidToken { what: "interval unit", token: "fortnight".into() }
        );

        let err = Predicate::parse("daily at noon").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidToken { what: "time of day", token: "noon".into() }
        );
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert!(matches!(
            Predicate::parse("daily at 25:00"),
            Err(ParseError::OutOfRange { what: "time of day", .. })
        ));
        assert!(matches!(
            Predicate::parse("monthly on 32"),
            Err(ParseError::OutOfRange { what: "day of month", .. })
        ));
        assert!(matches!(
            Predicate::parse("every 0 minutes"),
            Err(ParseError::OutOfRange { what: "interval count", .. })
        ));
    }

    #[test]
    fn predicate_serde_round_trip() {
        let predicate = Predicate::PriceThreshold { op: PriceOp::Above, value: dec!(42000) };
        let json = serde_json::to_string(&predicate).unwrap();
        let parsed: Predicate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, predicate);
    }
}
