// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wallet gateway trait for balance and address lookups.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::AutopayError;
use crate::types::WalletRef;

/// Gateway to the wallet backend.
///
/// Assumed eventually consistent: lookups may be slow or fail
/// transiently. Callers inside a tick treat failures as fail-closed
/// (skip this tick, retry on the next one) rather than propagating them.
#[async_trait]
pub trait WalletGateway: Send + Sync {
    /// Current spendable balance of the wallet.
    async fn balance(&self, wallet: &WalletRef) -> Result<Decimal, AutopayError>;

    /// Resolve the wallet's on-chain address.
    ///
    /// Absence indicates misconfiguration, not a transient fault.
    async fn address(&self, wallet: &WalletRef) -> Result<String, AutopayError>;
}
