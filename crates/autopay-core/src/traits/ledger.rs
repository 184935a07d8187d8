// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger store trait for durable transaction records.

use async_trait::async_trait;

use crate::error::AutopayError;
use crate::types::{NewTransaction, RuleId, TransactionId, TransactionPatch, TransactionRecord};

/// Durable keeper of transaction records.
///
/// Creating a record is the execution pipeline's *commit point*: once a
/// record exists, the pipeline owes it a terminal `completed` or `failed`
/// status update. Records are never left `pending` indefinitely.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Create a new record with `pending` status.
    async fn create(&self, tx: NewTransaction) -> Result<TransactionRecord, AutopayError>;

    /// Apply a patch to an existing record, returning the updated record.
    async fn update(
        &self,
        id: &TransactionId,
        patch: TransactionPatch,
    ) -> Result<TransactionRecord, AutopayError>;

    /// Fetch a record by id.
    async fn get(&self, id: &TransactionId) -> Result<Option<TransactionRecord>, AutopayError>;

    /// All records created for the given rule, oldest first.
    async fn list_for_rule(&self, rule_id: &RuleId)
        -> Result<Vec<TransactionRecord>, AutopayError>;
}
