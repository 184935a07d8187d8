// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the autopay engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level autopay configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutopayConfig {
    /// Rule engine timing and wallet settings.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Rule engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Seconds between condition evaluations for each monitored rule.
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Simulated network-confirmation delay before a transaction is marked
    /// completed, in milliseconds.
    #[serde(default = "default_settlement_delay_ms")]
    pub settlement_delay_ms: u64,

    /// Market symbol queried for price-based conditions.
    #[serde(default = "default_price_symbol")]
    pub price_symbol: String,

    /// Wallet reference used to fund executed payments.
    #[serde(default = "default_funding_wallet")]
    pub funding_wallet: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            settlement_delay_ms: default_settlement_delay_ms(),
            price_symbol: default_price_symbol(),
            funding_wallet: default_funding_wallet(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_tick_interval_secs() -> u64 {
    60
}

fn default_settlement_delay_ms() -> u64 {
    2_000
}

fn default_price_symbol() -> String {
    "BTC-USD".to_string()
}

fn default_funding_wallet() -> String {
    "primary".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
