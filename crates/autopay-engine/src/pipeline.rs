// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution pipeline: from satisfied condition to settled transaction.
//!
//! Steps, each with an explicit failure short-circuit:
//! 1. Active check (no side effects on an inactive rule)
//! 2. Funds check against the funding wallet (silent, retryable skip)
//! 3. Sender address resolution (hard failure, rule stays active)
//! 4. Ledger record creation — the *commit point*
//! 5. Settlement simulation, driving the record to a terminal status
//! 6. `last_triggered` update on success
//! 7. Best-effort notification
//!
//! Past the commit point the pipeline always resolves the record to
//! `completed` or `failed`; it is never left `pending`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use autopay_core::types::{
    AutopayRule, Execution, NewTransaction, TransactionPatch, WalletRef,
};
use autopay_core::{ClockSource, LedgerStore, NotificationSink, WalletGateway};

use crate::store::{RulePatch, RuleStore};

/// Failure reason for executions on an inactive rule.
pub const ERR_RULE_INACTIVE: &str = "rule inactive";
/// Failure reason when the funding wallet cannot cover the amount.
pub const ERR_INSUFFICIENT_BALANCE: &str = "insufficient balance";
/// Failure reason when the sender address cannot be resolved.
pub const ERR_ADDRESS_UNAVAILABLE: &str = "wallet address unavailable";
/// Failure reason when the ledger rejects record creation.
pub const ERR_LEDGER_UNAVAILABLE: &str = "ledger unavailable";
/// Failure reason when settlement cannot complete.
pub const ERR_SETTLEMENT_FAILED: &str = "settlement failed";

/// Validates funds, creates and settles ledger transactions, and reports
/// the outcome of one execution attempt.
pub struct ExecutionPipeline {
    wallet: Arc<dyn WalletGateway>,
    ledger: Arc<dyn LedgerStore>,
    store: Arc<dyn RuleStore>,
    clock: Arc<dyn ClockSource>,
    notifier: Arc<dyn NotificationSink>,
    /// Wallet funding all executed payments.
    funding_wallet: WalletRef,
    /// Simulated network-confirmation delay. Isolated behind the same
    /// step a real confirmation watcher would implement.
    settlement_delay: Duration,
}

impl ExecutionPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wallet: Arc<dyn WalletGateway>,
        ledger: Arc<dyn LedgerStore>,
        store: Arc<dyn RuleStore>,
        clock: Arc<dyn ClockSource>,
        notifier: Arc<dyn NotificationSink>,
        funding_wallet: WalletRef,
        settlement_delay: Duration,
    ) -> Self {
        Self {
            wallet,
            ledger,
            store,
            clock,
            notifier,
            funding_wallet,
            settlement_delay,
        }
    }

    /// Run one execution attempt for a rule. Infallible from the caller's
    /// perspective: every failure path resolves to an [`Execution`] with
    /// `success == false`.
    pub async fn execute(&self, rule: &AutopayRule) -> Execution {
        let executed_at = self.clock.now();

        // 1. Active check.
        if !rule.active {
            debug!(rule_id = %rule.id, "execution refused: rule inactive");
            return Execution::failed(rule.id.clone(), executed_at, ERR_RULE_INACTIVE);
        }

        // 2. Funds check. A transient gateway failure is indistinguishable
        // from a short balance for this tick: skip silently, retry next tick.
        let balance = match self.wallet.balance(&self.funding_wallet).await {
            Ok(balance) => balance,
            Err(error) => {
                warn!(rule_id = %rule.id, %error, "balance lookup failed, skipping execution");
                return Execution::failed(
                    rule.id.clone(),
                    executed_at,
                    ERR_INSUFFICIENT_BALANCE,
                );
            }
        };
        if balance < rule.amount {
            debug!(
                rule_id = %rule.id,
                %balance,
                amount = %rule.amount,
                "insufficient balance, skipping execution"
            );
            return Execution::failed(rule.id.clone(), executed_at, ERR_INSUFFICIENT_BALANCE);
        }

        // 3. Sender address resolution. Absence indicates misconfiguration;
        // the rule stays active so the operator can fix connectivity.
        let sender_address = match self.wallet.address(&self.funding_wallet).await {
            Ok(address) => address,
            Err(error) => {
                error!(rule_id = %rule.id, %error, "sender address unresolved");
                let execution =
                    Execution::failed(rule.id.clone(), executed_at, ERR_ADDRESS_UNAVAILABLE);
                self.notify(rule, &execution).await;
                return execution;
            }
        };

        // 4. Record creation: the commit point.
        let record = match self
            .ledger
            .create(NewTransaction {
                rule_id: rule.id.clone(),
                recipient: rule.recipient.clone(),
                sender_address,
                amount: rule.amount,
            })
            .await
        {
            Ok(record) => record,
            Err(error) => {
                error!(rule_id = %rule.id, %error, "ledger record creation failed");
                let execution =
                    Execution::failed(rule.id.clone(), executed_at, ERR_LEDGER_UNAVAILABLE);
                self.notify(rule, &execution).await;
                return execution;
            }
        };

        // 5. Settlement simulation.
        tokio::time::sleep(self.settlement_delay).await;
        let settlement_ref = format!("settlement-{}", uuid::Uuid::new_v4());
        let execution = match self
            .ledger
            .update(&record.id, TransactionPatch::completed(settlement_ref))
            .await
        {
            Ok(settled) => {
                // 6. Record the trigger time on the rule.
                let triggered_at = self.clock.now();
                if let Err(error) = self
                    .store
                    .update(
                        &rule.id,
                        RulePatch {
                            last_triggered: Some(triggered_at),
                            ..Default::default()
                        },
                    )
                    .await
                {
                    warn!(rule_id = %rule.id, %error, "failed to record last_triggered");
                }
                info!(
                    rule_id = %rule.id,
                    transaction_id = %settled.id,
                    amount = %rule.amount,
                    "execution settled"
                );
                Execution::succeeded(rule.id.clone(), executed_at, settled.id)
            }
            Err(error) => {
                // The record exists and owes a terminal status: mark it
                // failed, loudly if even that cannot be done.
                error!(rule_id = %rule.id, %error, "settlement failed, marking transaction failed");
                if let Err(mark_error) =
                    self.ledger.update(&record.id, TransactionPatch::failed()).await
                {
                    error!(
                        rule_id = %rule.id,
                        transaction_id = %record.id,
                        %mark_error,
                        "could not mark transaction failed; record may be stuck pending"
                    );
                }
                Execution {
                    rule_id: rule.id.clone(),
                    executed_at,
                    transaction_id: Some(record.id),
                    success: false,
                    error: Some(ERR_SETTLEMENT_FAILED.to_string()),
                }
            }
        };

        // 7. Best-effort notification.
        self.notify(rule, &execution).await;
        execution
    }

    async fn notify(&self, rule: &AutopayRule, execution: &Execution) {
        if let Err(error) = self.notifier.notify(rule, execution).await {
            warn!(rule_id = %rule.id, %error, "notification delivery failed");
        }
    }
}
