// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as non-zero intervals and non-empty symbols.

use crate::diagnostic::ConfigError;
use crate::model::AutopayConfig;

/// Maximum allowed settlement simulation delay.
const MAX_SETTLEMENT_DELAY_MS: u64 = 600_000;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &AutopayConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.engine.tick_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "engine.tick_interval_secs must be at least 1".to_string(),
        });
    }

    if config.engine.settlement_delay_ms > MAX_SETTLEMENT_DELAY_MS {
        errors.push(ConfigError::Validation {
            message: format!(
                "engine.settlement_delay_ms must be at most {} (10 minutes), got {}",
                MAX_SETTLEMENT_DELAY_MS, config.engine.settlement_delay_ms
            ),
        });
    }

    if config.engine.price_symbol.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "engine.price_symbol must not be empty".to_string(),
        });
    }

    if config.engine.funding_wallet.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "engine.funding_wallet must not be empty".to_string(),
        });
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.log.level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` is not one of: {}",
                config.log.level,
                valid_levels.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
