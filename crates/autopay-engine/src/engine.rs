// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine façade: the one public entry point for rule lifecycle.
//!
//! Wires the store, evaluator, pipeline, and scheduler together and
//! exposes the rule operations callers use: create, activate, deactivate,
//! delete, manual trigger, stats, shutdown.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};

use autopay_config::model::EngineConfig;
use autopay_core::condition::Predicate;
use autopay_core::error::AutopayError;
use autopay_core::types::{AutopayRule, Execution, RuleId, WalletRef};
use autopay_core::{ClockSource, EventBus, LedgerStore, NotificationSink, PriceFeed, WalletGateway};

use crate::condition::ConditionEvaluator;
use crate::pipeline::ExecutionPipeline;
use crate::scheduler::RuleScheduler;
use crate::store::{RulePatch, RuleStore};

/// Aggregate rule counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// All rules in the store, active or not.
    pub total_rules: usize,
    /// Rules with `active == true`.
    pub active_rules: usize,
    /// Rules that have executed at least once in their lifetime.
    pub triggered_rules: usize,
}

/// Standing-payment engine.
///
/// Single-instance by design: the engine owns the scheduler and all
/// monitor tasks, and every rule mutation funnels through it.
pub struct AutopayEngine {
    store: Arc<dyn RuleStore>,
    pipeline: Arc<ExecutionPipeline>,
    scheduler: RuleScheduler,
    clock: Arc<dyn ClockSource>,
    initialized: Mutex<bool>,
}

impl AutopayEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn RuleStore>,
        wallet: Arc<dyn WalletGateway>,
        ledger: Arc<dyn LedgerStore>,
        price_feed: Arc<dyn PriceFeed>,
        bus: Arc<dyn EventBus>,
        notifier: Arc<dyn NotificationSink>,
        clock: Arc<dyn ClockSource>,
        config: &EngineConfig,
    ) -> Self {
        let evaluator = Arc::new(ConditionEvaluator::new(
            price_feed,
            config.price_symbol.clone(),
        ));
        let pipeline = Arc::new(ExecutionPipeline::new(
            wallet,
            ledger,
            store.clone(),
            clock.clone(),
            notifier,
            WalletRef(config.funding_wallet.clone()),
            Duration::from_millis(config.settlement_delay_ms),
        ));
        let scheduler = RuleScheduler::new(
            store.clone(),
            evaluator,
            pipeline.clone(),
            bus,
            clock.clone(),
            Duration::from_secs(config.tick_interval_secs),
        );
        Self {
            store,
            pipeline,
            scheduler,
            clock,
            initialized: Mutex::new(false),
        }
    }

    /// Arm monitors for every active rule already in the store.
    ///
    /// Idempotent: a second call is a no-op. Call once at startup; rules
    /// created afterwards are armed by [`create_rule`](Self::create_rule).
    pub async fn initialize(&self) -> Result<(), AutopayError> {
        let mut initialized = self.initialized.lock().await;
        if *initialized {
            return Ok(());
        }

        let active = self.store.list_active().await?;
        for rule in &active {
            self.scheduler.start_monitoring(rule).await;
        }
        *initialized = true;
        info!(monitors = active.len(), "engine initialized");
        Ok(())
    }

    /// Create a rule from a natural-language condition and start
    /// monitoring it immediately.
    pub async fn create_rule(
        &self,
        recipient: &str,
        amount: Decimal,
        condition: &str,
    ) -> Result<AutopayRule, AutopayError> {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(AutopayError::Validation(
                "recipient must not be empty".into(),
            ));
        }
        if amount <= Decimal::ZERO {
            return Err(AutopayError::Validation(format!(
                "amount must be positive, got {amount}"
            )));
        }
        let predicate = Predicate::parse(condition)?;

        let rule = AutopayRule::new(
            WalletRef(recipient.to_string()),
            amount,
            predicate,
            self.clock.now(),
        );
        self.store.insert(rule.clone()).await?;
        self.scheduler.start_monitoring(&rule).await;

        info!(
            rule_id = %rule.id,
            recipient = %rule.recipient,
            amount = %rule.amount,
            condition = ?rule.condition,
            "rule created"
        );
        Ok(rule)
    }

    /// Reactivate a rule and re-arm its monitor. Returns `false` when the
    /// rule does not exist.
    pub async fn activate_rule(&self, rule_id: &RuleId) -> Result<bool, AutopayError> {
        let patch = RulePatch {
            active: Some(true),
            ..Default::default()
        };
        let rule = match self.store.update(rule_id, patch).await {
            Ok(rule) => rule,
            Err(AutopayError::RuleNotFound(_)) => return Ok(false),
            Err(error) => return Err(error),
        };
        self.scheduler.start_monitoring(&rule).await;
        info!(rule_id = %rule_id, "rule activated");
        Ok(true)
    }

    /// Deactivate a rule and stop its monitor. The rule and its history
    /// are retained. Returns `false` when the rule does not exist.
    pub async fn deactivate_rule(&self, rule_id: &RuleId) -> Result<bool, AutopayError> {
        let patch = RulePatch {
            active: Some(false),
            ..Default::default()
        };
        match self.store.update(rule_id, patch).await {
            Ok(_) => {}
            Err(AutopayError::RuleNotFound(_)) => return Ok(false),
            Err(error) => return Err(error),
        }
        self.scheduler.stop_monitoring(rule_id).await;
        info!(rule_id = %rule_id, "rule deactivated");
        Ok(true)
    }

    /// Remove a rule permanently. Its ledger history survives. Returns
    /// `false` when the rule does not exist.
    pub async fn delete_rule(&self, rule_id: &RuleId) -> Result<bool, AutopayError> {
        // Stop the monitor before removing the rule so no tick observes a
        // half-deleted state. An in-flight execution still settles.
        self.scheduler.stop_monitoring(rule_id).await;
        let deleted = self.store.delete(rule_id).await?;
        if deleted {
            self.scheduler.drop_gate(rule_id).await;
            info!(rule_id = %rule_id, "rule deleted");
        }
        Ok(deleted)
    }

    /// Execute a rule now, bypassing its condition.
    ///
    /// Serialized with scheduled ticks through the rule's execution gate,
    /// so a manual trigger never overlaps a scheduled run of the same
    /// rule. All pipeline checks still apply; on success `last_triggered`
    /// advances and suppresses the enclosing time window.
    pub async fn manually_trigger_rule(
        &self,
        rule_id: &RuleId,
    ) -> Result<Execution, AutopayError> {
        let gate = self.scheduler.execution_gate(rule_id).await;
        let _serialized = gate.lock().await;

        let rule = self
            .store
            .get(rule_id)
            .await?
            .ok_or_else(|| AutopayError::RuleNotFound(rule_id.clone()))?;

        info!(rule_id = %rule_id, "manual trigger");
        let execution = self.pipeline.execute(&rule).await;
        if !execution.success {
            warn!(
                rule_id = %rule_id,
                error = ?execution.error,
                "manual trigger failed"
            );
        }
        Ok(execution)
    }

    /// Fetch a rule by id.
    pub async fn get_rule(&self, rule_id: &RuleId) -> Result<Option<AutopayRule>, AutopayError> {
        self.store.get(rule_id).await
    }

    /// All rules, active or not.
    pub async fn list_rules(&self) -> Result<Vec<AutopayRule>, AutopayError> {
        self.store.list().await
    }

    /// Aggregate counters over the current rule set.
    pub async fn get_stats(&self) -> Result<EngineStats, AutopayError> {
        let rules = self.store.list().await?;
        Ok(EngineStats {
            total_rules: rules.len(),
            active_rules: rules.iter().filter(|r| r.active).count(),
            triggered_rules: rules.iter().filter(|r| r.last_triggered.is_some()).count(),
        })
    }

    /// Number of armed monitors, for introspection and tests.
    pub async fn active_monitors(&self) -> usize {
        self.scheduler.active_monitor_count().await
    }

    /// Whether the rule currently has an armed monitor.
    pub async fn is_monitoring(&self, rule_id: &RuleId) -> bool {
        self.scheduler.is_monitoring(rule_id).await
    }

    /// Stop all monitors. Rule and ledger state is left intact; a later
    /// [`initialize`](Self::initialize) re-arms from the store.
    pub async fn shutdown(&self) {
        self.scheduler.stop_all().await;
        *self.initialized.lock().await = false;
        info!("engine shut down");
    }
}
