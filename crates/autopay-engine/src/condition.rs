// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stateless condition evaluation.
//!
//! The evaluator holds no per-rule state: de-duplication for every
//! time-based predicate derives from `created_at` and `last_triggered`
//! carried in the [`EvalContext`], so a process restart never
//! desynchronizes a schedule and never re-fires a window that already
//! triggered.
//!
//! Failure policy is fail-closed: a price feed error is logged and the
//! tick evaluates to `false`; it never reaches the scheduler.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use autopay_core::condition::{Predicate, PriceOp, Weekday};
use autopay_core::types::DomainEvent;
use autopay_core::PriceFeed;

/// Per-tick evaluation inputs.
///
/// `events` carries the rule's event subscription receiver when the
/// predicate is event-based; evaluation consumes at most one event from
/// it. Contexts without a receiver (e.g. manual paths) evaluate
/// event-based predicates to `false`.
pub struct EvalContext<'a> {
    pub now: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub last_triggered: Option<DateTime<Utc>>,
    pub events: Option<&'a mut mpsc::Receiver<DomainEvent>>,
}

/// Evaluates parsed predicates against current time, price, and event
/// state.
pub struct ConditionEvaluator {
    price_feed: Arc<dyn PriceFeed>,
    price_symbol: String,
}

impl ConditionEvaluator {
    pub fn new(price_feed: Arc<dyn PriceFeed>, price_symbol: String) -> Self {
        Self {
            price_feed,
            price_symbol,
        }
    }

    /// Evaluate a predicate for one tick. Never fails: every failure path
    /// resolves to `false`.
    pub async fn evaluate(&self, predicate: &Predicate, ctx: &mut EvalContext<'_>) -> bool {
        match predicate {
            Predicate::Periodic { interval_secs } => periodic_satisfied(*interval_secs, ctx),
            Predicate::DailyAt { hour, minute } => {
                window_satisfied(daily_target(ctx.now, *hour, *minute), ctx)
            }
            Predicate::WeeklyOn { weekday } => {
                window_satisfied(weekly_target(ctx.now, *weekday), ctx)
            }
            Predicate::MonthlyOn { day_of_month } => {
                window_satisfied(monthly_target(ctx.now, *day_of_month), ctx)
            }
            Predicate::PriceThreshold { op, value } => self.price_satisfied(*op, *value).await,
            Predicate::EventOccurred { event_type } => event_satisfied(event_type, ctx),
        }
    }

    async fn price_satisfied(&self, op: PriceOp, value: Decimal) -> bool {
        match self.price_feed.current_price(&self.price_symbol).await {
            Ok(price) => match op {
                PriceOp::Above => price > value,
                PriceOp::Below => price < value,
            },
            Err(error) => {
                warn!(
                    symbol = %self.price_symbol,
                    %error,
                    "price lookup failed, condition treated as unsatisfied"
                );
                false
            }
        }
    }
}

/// True once per interval boundary relative to `created_at`.
///
/// Boundaries are deterministic modulo arithmetic, so a restarted process
/// lands on the same schedule: boundary index `k` covers the instant
/// `created_at + k * interval`, and the predicate fires when the index at
/// `now` exceeds the index at the last trigger.
fn periodic_satisfied(interval_secs: u64, ctx: &EvalContext<'_>) -> bool {
    let interval = interval_secs as i64;
    if interval <= 0 {
        return false;
    }
    let elapsed = (ctx.now - ctx.created_at).num_seconds();
    if elapsed < interval {
        return false;
    }
    let index_now = elapsed.div_euclid(interval);
    let anchor = ctx.last_triggered.unwrap_or(ctx.created_at);
    let index_last = (anchor - ctx.created_at).num_seconds().div_euclid(interval);
    index_now > index_last
}

/// True on the first tick at/after `target` not already covered by
/// `last_triggered`, and only for windows that postdate rule creation.
fn window_satisfied(target: Option<DateTime<Utc>>, ctx: &EvalContext<'_>) -> bool {
    let Some(target) = target else {
        return false;
    };
    if target < ctx.created_at {
        return false;
    }
    ctx.now >= target && ctx.last_triggered.is_none_or(|last| last < target)
}

/// Most recent instant at `hour:minute` UTC on or before `now`.
fn daily_target(now: DateTime<Utc>, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let today = now.date_naive().and_hms_opt(hour, minute, 0)?;
    let today = Utc.from_utc_datetime(&today);
    if today <= now {
        Some(today)
    } else {
        today.checked_sub_days(Days::new(1))
    }
}

/// Most recent occurrence of `weekday` at 00:00 UTC on or before `now`.
fn weekly_target(now: DateTime<Utc>, weekday: Weekday) -> Option<DateTime<Utc>> {
    let days_back =
        (now.weekday().num_days_from_monday() + 7 - weekday.days_from_monday()) % 7;
    let date = now.date_naive().checked_sub_days(Days::new(days_back as u64))?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Most recent occurrence of `day_of_month` at 00:00 UTC on or before
/// `now`, clamping the day to the length of the month (so "monthly on 31"
/// fires on Feb 28/29).
fn monthly_target(now: DateTime<Utc>, day_of_month: u32) -> Option<DateTime<Utc>> {
    let today = now.date_naive();
    let candidate = clamped_date(today.year(), today.month(), day_of_month)?;
    let target = if candidate <= today {
        candidate
    } else if today.month() == 1 {
        clamped_date(today.year() - 1, 12, day_of_month)?
    } else {
        clamped_date(today.year(), today.month() - 1, day_of_month)?
    };
    Some(Utc.from_utc_datetime(&target.and_hms_opt(0, 0, 0)?))
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last))
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((next - first).num_days() as u32)
}

/// Consume at most one matching event from the rule's subscription.
fn event_satisfied(event_type: &str, ctx: &mut EvalContext<'_>) -> bool {
    match ctx.events.as_mut() {
        Some(rx) => match rx.try_recv() {
            Ok(event) => {
                debug!(
                    event_type,
                    occurred_at = %event.occurred_at,
                    "consumed matching event"
                );
                true
            }
            Err(_) => false,
        },
        None => false,
    }
}
