// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Simulated collaborators for the `serve` command.
//!
//! The daemon ships without real wallet, market-data, or messaging
//! integrations; these stand-ins let the engine run end-to-end. Each one
//! implements the same seam a production adapter would.

use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use autopay_core::error::AutopayError;
use autopay_core::types::{AutopayRule, Execution, WalletRef};
use autopay_core::{NotificationSink, PriceFeed, WalletGateway};

/// Wallet gateway with a fixed balance and derived addresses.
pub struct SimWallet {
    balance: Decimal,
}

impl SimWallet {
    pub fn new(balance: Decimal) -> Self {
        Self { balance }
    }
}

#[async_trait]
impl WalletGateway for SimWallet {
    async fn balance(&self, _wallet: &WalletRef) -> Result<Decimal, AutopayError> {
        Ok(self.balance)
    }

    async fn address(&self, wallet: &WalletRef) -> Result<String, AutopayError> {
        Ok(format!("sim-{wallet}"))
    }
}

/// Price feed that walks a fixed cycle around a base quote.
///
/// Deterministic on purpose: repeated runs of the demo cross the same
/// thresholds at the same ticks.
pub struct SimPriceFeed {
    base: Decimal,
    tick: Mutex<u64>,
}

impl SimPriceFeed {
    pub fn new(base: Decimal) -> Self {
        Self {
            base,
            tick: Mutex::new(0),
        }
    }
}

#[async_trait]
impl PriceFeed for SimPriceFeed {
    async fn current_price(&self, _symbol: &str) -> Result<Decimal, AutopayError> {
        let mut tick = self.tick.lock().map_err(|_| {
            AutopayError::PriceFeed {
                message: "price state poisoned".into(),
                source: None,
            }
        })?;
        *tick += 1;
        // +/- 2% swing over an 8-tick cycle.
        let phase = (*tick % 8) as i64 - 4;
        let swing = self.base * dec!(0.005) * Decimal::from(phase);
        Ok(self.base + swing)
    }
}

/// Notification sink that writes notices to the log.
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn notify(
        &self,
        rule: &AutopayRule,
        execution: &Execution,
    ) -> Result<(), AutopayError> {
        info!(
            rule_id = %rule.id,
            recipient = %rule.recipient,
            amount = %rule.amount,
            success = execution.success,
            transaction_id = ?execution.transaction_id,
            "payment notice"
        );
        Ok(())
    }
}
