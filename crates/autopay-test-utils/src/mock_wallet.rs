// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock wallet gateway with a settable balance and injectable failures.

use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use autopay_core::error::AutopayError;
use autopay_core::types::WalletRef;
use autopay_core::WalletGateway;

/// A wallet gateway backed by in-memory state.
///
/// Balance and failure modes can be flipped mid-test to simulate funds
/// arriving, the backend going away, or an unresolvable address.
pub struct MockWallet {
    balance: Mutex<Decimal>,
    fail_balance: Mutex<bool>,
    fail_address: Mutex<bool>,
}

impl MockWallet {
    pub fn new(balance: Decimal) -> Self {
        Self {
            balance: Mutex::new(balance),
            fail_balance: Mutex::new(false),
            fail_address: Mutex::new(false),
        }
    }

    /// Replace the current balance.
    pub fn set_balance(&self, balance: Decimal) {
        *self.balance.lock().unwrap() = balance;
    }

    /// Make subsequent balance lookups fail.
    pub fn fail_balance_lookups(&self, fail: bool) {
        *self.fail_balance.lock().unwrap() = fail;
    }

    /// Make subsequent address lookups fail.
    pub fn fail_address_lookups(&self, fail: bool) {
        *self.fail_address.lock().unwrap() = fail;
    }
}

#[async_trait]
impl WalletGateway for MockWallet {
    async fn balance(&self, wallet: &WalletRef) -> Result<Decimal, AutopayError> {
        if *self.fail_balance.lock().unwrap() {
            return Err(AutopayError::Wallet {
                message: format!("balance lookup failed for {wallet}"),
                source: None,
            });
        }
        Ok(*self.balance.lock().unwrap())
    }

    async fn address(&self, wallet: &WalletRef) -> Result<String, AutopayError> {
        if *self.fail_address.lock().unwrap() {
            return Err(AutopayError::Wallet {
                message: format!("no address for {wallet}"),
                source: None,
            });
        }
        Ok(format!("mock-address-{wallet}"))
    }
}
