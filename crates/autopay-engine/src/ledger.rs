// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory ledger store.
//!
//! The shipped [`LedgerStore`] backend. Real transaction
//! construction/signing lives behind the trait in the surrounding
//! application; the engine only needs durable-enough records it can drive
//! from `pending` to a terminal status.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use autopay_core::error::AutopayError;
use autopay_core::types::{
    NewTransaction, RuleId, TransactionId, TransactionPatch, TransactionRecord,
    TransactionStatus,
};
use autopay_core::{ClockSource, LedgerStore};

#[derive(Default)]
struct Inner {
    records: HashMap<TransactionId, TransactionRecord>,
    /// Insertion order, for oldest-first history queries.
    order: Vec<TransactionId>,
}

/// In-memory [`LedgerStore`] implementation.
pub struct MemoryLedger {
    inner: RwLock<Inner>,
    clock: Arc<dyn ClockSource>,
}

impl MemoryLedger {
    pub fn new(clock: Arc<dyn ClockSource>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }

    /// Total number of records, for diagnostics and tests.
    pub async fn record_count(&self) -> usize {
        self.inner.read().await.records.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn create(&self, tx: NewTransaction) -> Result<TransactionRecord, AutopayError> {
        let now = self.clock.now();
        let record = TransactionRecord {
            id: TransactionId::generate(),
            rule_id: tx.rule_id,
            recipient: tx.recipient,
            sender_address: tx.sender_address,
            amount: tx.amount,
            status: TransactionStatus::Pending,
            settlement_ref: None,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().await;
        inner.order.push(record.id.clone());
        inner.records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: &TransactionId,
        patch: TransactionPatch,
    ) -> Result<TransactionRecord, AutopayError> {
        let now = self.clock.now();
        let mut inner = self.inner.write().await;
        let record = inner.records.get_mut(id).ok_or_else(|| AutopayError::Ledger {
            message: format!("transaction {id} not found"),
            source: None,
        })?;

        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(settlement_ref) = patch.settlement_ref {
            record.settlement_ref = Some(settlement_ref);
        }
        record.updated_at = now;
        Ok(record.clone())
    }

    async fn get(&self, id: &TransactionId) -> Result<Option<TransactionRecord>, AutopayError> {
        Ok(self.inner.read().await.records.get(id).cloned())
    }

    async fn list_for_rule(
        &self,
        rule_id: &RuleId,
    ) -> Result<Vec<TransactionRecord>, AutopayError> {
        let inner = self.inner.read().await;
        Ok(inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id))
            .filter(|r| &r.rule_id == rule_id)
            .cloned()
            .collect())
    }
}
