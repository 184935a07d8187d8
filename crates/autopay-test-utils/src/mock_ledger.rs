// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ledger store with injectable faults.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use autopay_core::error::AutopayError;
use autopay_core::types::{
    NewTransaction, RuleId, TransactionId, TransactionPatch, TransactionRecord,
};
use autopay_core::{ClockSource, LedgerStore};
use autopay_engine::MemoryLedger;

/// A [`LedgerStore`] that behaves like [`MemoryLedger`] until told to fail.
///
/// `fail_next_creates` / `fail_next_updates` arm a countdown of injected
/// errors, for driving the pipeline's commit-failure and
/// settlement-failure branches.
pub struct MockLedger {
    inner: MemoryLedger,
    fail_creates: AtomicUsize,
    fail_updates: AtomicUsize,
}

impl MockLedger {
    pub fn new(clock: Arc<dyn ClockSource>) -> Self {
        Self {
            inner: MemoryLedger::new(clock),
            fail_creates: AtomicUsize::new(0),
            fail_updates: AtomicUsize::new(0),
        }
    }

    /// Make the next `n` create calls fail.
    pub fn fail_next_creates(&self, n: usize) {
        self.fail_creates.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` update calls fail.
    pub fn fail_next_updates(&self, n: usize) {
        self.fail_updates.store(n, Ordering::SeqCst);
    }

    /// Total number of records, for assertions.
    pub async fn record_count(&self) -> usize {
        self.inner.record_count().await
    }
}

/// Consume one armed fault, if any.
fn take_fault(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl LedgerStore for MockLedger {
    async fn create(&self, tx: NewTransaction) -> Result<TransactionRecord, AutopayError> {
        if take_fault(&self.fail_creates) {
            return Err(AutopayError::Ledger {
                message: "injected create failure".into(),
                source: None,
            });
        }
        self.inner.create(tx).await
    }

    async fn update(
        &self,
        id: &TransactionId,
        patch: TransactionPatch,
    ) -> Result<TransactionRecord, AutopayError> {
        if take_fault(&self.fail_updates) {
            return Err(AutopayError::Ledger {
                message: "injected update failure".into(),
                source: None,
            });
        }
        self.inner.update(id, patch).await
    }

    async fn get(&self, id: &TransactionId) -> Result<Option<TransactionRecord>, AutopayError> {
        self.inner.get(id).await
    }

    async fn list_for_rule(
        &self,
        rule_id: &RuleId,
    ) -> Result<Vec<TransactionRecord>, AutopayError> {
        self.inner.list_for_rule(rule_id).await
    }
}
