// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the x402 autopay engine.

use thiserror::Error;

use crate::condition::ParseError;
use crate::types::RuleId;

/// The primary error type used across all autopay collaborator traits and
/// core operations.
#[derive(Debug, Error)]
pub enum AutopayError {
    /// Bad input at rule-creation time (empty recipient, non-positive
    /// amount). The rule is never created.
    #[error("validation error: {0}")]
    Validation(String),

    /// The condition text could not be parsed into a predicate.
    #[error("condition parse error: {0}")]
    Parse(#[from] ParseError),

    /// The requested rule does not exist in the rule store.
    #[error("rule not found: {0}")]
    RuleNotFound(RuleId),

    /// Wallet gateway errors (balance lookup, address resolution).
    #[error("wallet gateway error: {message}")]
    Wallet {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Ledger store errors (record creation, status updates).
    #[error("ledger error: {message}")]
    Ledger {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Price feed errors. Always treated as "condition not satisfied" by
    /// the evaluator, never propagated out of a tick.
    #[error("price feed error: {message}")]
    PriceFeed {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Event bus subscription errors.
    #[error("event bus error: {0}")]
    EventBus(String),

    /// Notification delivery errors. Best-effort: swallowed by the
    /// execution pipeline, never affect rule or execution state.
    #[error("notification error: {0}")]
    Notification(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
