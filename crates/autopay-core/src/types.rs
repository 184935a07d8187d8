// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common domain types shared across the autopay collaborator traits and
//! the engine crates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::condition::Predicate;

/// Unique identifier for an autopay rule. Assigned at creation, immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleId(pub String);

impl RuleId {
    /// Generate a fresh random rule id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a ledger transaction record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl TransactionId {
    /// Generate a fresh random transaction id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to a wallet known to the [`WalletGateway`](crate::WalletGateway).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletRef(pub String);

impl std::fmt::Display for WalletRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A standing payment instruction: pay `amount` to `recipient` whenever
/// `condition` becomes true.
///
/// Invariants:
/// - `amount > 0`, enforced at creation and never mutated.
/// - `last_triggered`, once set, is monotonically non-decreasing
///   (enforced by the rule store).
/// - A rule with `active == false` has no running monitor task
///   (enforced by the scheduler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutopayRule {
    pub id: RuleId,
    /// Payee wallet reference. Non-empty.
    pub recipient: WalletRef,
    /// Positive payment amount.
    pub amount: Decimal,
    /// Parsed condition. Raw text is an input format, not stored.
    pub condition: Predicate,
    pub active: bool,
    /// Set by the execution pipeline after the first successful execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_triggered: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AutopayRule {
    /// Create a new rule, active by default, with a generated id.
    pub fn new(
        recipient: WalletRef,
        amount: Decimal,
        condition: Predicate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RuleId::generate(),
            recipient,
            amount,
            condition,
            active: true,
            last_triggered: None,
            created_at,
        }
    }
}

/// The record of one attempt (successful or not) to act on a satisfied
/// condition. Ephemeral: surfaced to the caller and the notification sink,
/// feeds back into the rule only via `last_triggered`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub rule_id: RuleId,
    pub executed_at: DateTime<Utc>,
    /// Present once the pipeline passed its ledger commit point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Execution {
    /// A successful execution backed by a settled ledger transaction.
    pub fn succeeded(
        rule_id: RuleId,
        executed_at: DateTime<Utc>,
        transaction_id: TransactionId,
    ) -> Self {
        Self {
            rule_id,
            executed_at,
            transaction_id: Some(transaction_id),
            success: true,
            error: None,
        }
    }

    /// A failed execution that never reached the ledger commit point.
    pub fn failed(
        rule_id: RuleId,
        executed_at: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            rule_id,
            executed_at,
            transaction_id: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Status of a ledger transaction record.
///
/// `Pending` is transitional: once a record is created the pipeline owes it
/// a terminal `Completed` or `Failed` update.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

/// A durable transaction record kept by the [`LedgerStore`](crate::LedgerStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: TransactionId,
    /// The autopay rule this transaction was executed for.
    pub rule_id: RuleId,
    pub recipient: WalletRef,
    pub sender_address: String,
    pub amount: Decimal,
    pub status: TransactionStatus,
    /// Settlement reference, set when the record reaches `Completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settlement_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating a new ledger record. Status is implicitly `Pending`.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub rule_id: RuleId,
    pub recipient: WalletRef,
    pub sender_address: String,
    pub amount: Decimal,
}

/// Patch for updating a ledger record. Only `Some` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub status: Option<TransactionStatus>,
    pub settlement_ref: Option<String>,
}

impl TransactionPatch {
    /// Mark the record completed with a settlement reference.
    pub fn completed(settlement_ref: String) -> Self {
        Self {
            status: Some(TransactionStatus::Completed),
            settlement_ref: Some(settlement_ref),
        }
    }

    /// Mark the record failed.
    pub fn failed() -> Self {
        Self {
            status: Some(TransactionStatus::Failed),
            settlement_ref: None,
        }
    }
}

/// A domain event delivered through the [`EventBus`](crate::EventBus),
/// e.g. "transaction received".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub event_type: String,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}
