// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock price feed returning a settable quote.

use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use autopay_core::error::AutopayError;
use autopay_core::PriceFeed;

/// A price feed serving one settable price for every symbol.
///
/// `None` simulates a feed outage: lookups fail until a price is set
/// again, which is what the fail-closed evaluation path exercises.
pub struct MockPriceFeed {
    price: Mutex<Option<Decimal>>,
}

impl MockPriceFeed {
    pub fn new(price: Decimal) -> Self {
        Self {
            price: Mutex::new(Some(price)),
        }
    }

    /// Replace the served price, or `None` to simulate an outage.
    pub fn set_price(&self, price: Option<Decimal>) {
        *self.price.lock().unwrap() = price;
    }
}

#[async_trait]
impl PriceFeed for MockPriceFeed {
    async fn current_price(&self, symbol: &str) -> Result<Decimal, AutopayError> {
        self.price
            .lock()
            .unwrap()
            .ok_or_else(|| AutopayError::PriceFeed {
                message: format!("no quote for {symbol}"),
                source: None,
            })
    }
}
