// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Price feed trait for price-based conditions.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::AutopayError;

/// Source of current market prices.
///
/// Queried fresh on every tick of a price-based rule. A feed error is
/// treated as "condition not satisfied this tick" by the evaluator
/// (fail-closed), logged, and never propagated to the scheduler.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn current_price(&self, symbol: &str) -> Result<Decimal, AutopayError>;
}
