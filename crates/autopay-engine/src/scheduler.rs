// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-rule monitoring scheduler.
//!
//! One tokio task per active rule, driven by a fixed-period interval
//! timer and a per-rule [`CancellationToken`]. Each monitor goes through
//! states: Monitoring -> Evaluating -> (Triggering -> Monitoring).
//!
//! Concurrency model:
//! - Monitors for *different* rules run independently.
//! - Ticks for the *same* rule are strictly serialized through an
//!   execution gate: an overrunning tick causes the next one to be
//!   skipped, not queued. Manual triggers take the same gate.
//! - Cancellation is observed only between ticks. An in-flight tick past
//!   its ledger commit point always runs to a terminal status; tasks are
//!   never aborted.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use autopay_core::condition::Predicate;
use autopay_core::types::{AutopayRule, DomainEvent, RuleId};
use autopay_core::{ClockSource, EventBus};

use crate::condition::{ConditionEvaluator, EvalContext};
use crate::pipeline::ExecutionPipeline;
use crate::store::RuleStore;

/// States in the per-rule monitor FSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No timer armed.
    Stopped,
    /// Recurring timer armed; the only state in which a tick fires.
    Monitoring,
    /// Transient: running the condition evaluator for one tick.
    Evaluating,
    /// Condition held: running the execution pipeline to completion.
    Triggering,
}

impl std::fmt::Display for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MonitorState::Stopped => write!(f, "stopped"),
            MonitorState::Monitoring => write!(f, "monitoring"),
            MonitorState::Evaluating => write!(f, "evaluating"),
            MonitorState::Triggering => write!(f, "triggering"),
        }
    }
}

struct MonitorHandle {
    cancel: CancellationToken,
}

/// Owns one monitoring task per active rule.
pub struct RuleScheduler {
    store: Arc<dyn RuleStore>,
    evaluator: Arc<ConditionEvaluator>,
    pipeline: Arc<ExecutionPipeline>,
    bus: Arc<dyn EventBus>,
    clock: Arc<dyn ClockSource>,
    tick_interval: Duration,
    monitors: Mutex<HashMap<RuleId, MonitorHandle>>,
    /// Execution gates outlive arm/stop cycles so manual triggers stay
    /// serialized with scheduled ticks even while a rule is stopped.
    gates: Mutex<HashMap<RuleId, Arc<Mutex<()>>>>,
}

impl RuleScheduler {
    pub fn new(
        store: Arc<dyn RuleStore>,
        evaluator: Arc<ConditionEvaluator>,
        pipeline: Arc<ExecutionPipeline>,
        bus: Arc<dyn EventBus>,
        clock: Arc<dyn ClockSource>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            store,
            evaluator,
            pipeline,
            bus,
            clock,
            tick_interval,
            monitors: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Arm monitoring for a rule.
    ///
    /// Idempotent: an existing monitor is cancelled and replaced by a
    /// fresh one, never duplicated. Event-based rules are subscribed on
    /// the bus here, so each armed monitor owns its own event stream.
    pub async fn start_monitoring(&self, rule: &AutopayRule) {
        let mut monitors = self.monitors.lock().await;
        if let Some(stale) = monitors.remove(&rule.id) {
            stale.cancel.cancel();
            debug!(rule_id = %rule.id, "replacing existing monitor");
        }

        let events = match &rule.condition {
            Predicate::EventOccurred { event_type } => {
                match self.bus.subscribe(event_type).await {
                    Ok(rx) => Some(rx),
                    Err(error) => {
                        warn!(
                            rule_id = %rule.id,
                            event_type = %event_type,
                            %error,
                            "event subscription failed; monitor armed but will not fire"
                        );
                        None
                    }
                }
            }
            _ => None,
        };

        let cancel = CancellationToken::new();
        let task = MonitorTask {
            rule_id: rule.id.clone(),
            store: self.store.clone(),
            evaluator: self.evaluator.clone(),
            pipeline: self.pipeline.clone(),
            clock: self.clock.clone(),
            gate: self.execution_gate(&rule.id).await,
            events,
            cancel: cancel.clone(),
            tick_interval: self.tick_interval,
        };
        tokio::spawn(task.run());

        monitors.insert(rule.id.clone(), MonitorHandle { cancel });
        debug!(rule_id = %rule.id, period = ?self.tick_interval, "monitoring armed");
    }

    /// Cancel a rule's monitor. Returns `false` when none was armed.
    ///
    /// Only the timer is cancelled: a tick already executing finishes its
    /// pipeline (including settlement) before the task exits.
    pub async fn stop_monitoring(&self, rule_id: &RuleId) -> bool {
        let mut monitors = self.monitors.lock().await;
        match monitors.remove(rule_id) {
            Some(handle) => {
                handle.cancel.cancel();
                debug!(rule_id = %rule_id, "monitoring stopped");
                true
            }
            None => false,
        }
    }

    /// Cancel every monitor. Used by engine shutdown.
    pub async fn stop_all(&self) {
        let mut monitors = self.monitors.lock().await;
        let count = monitors.len();
        for (rule_id, handle) in monitors.drain() {
            handle.cancel.cancel();
            debug!(rule_id = %rule_id, "monitoring stopped");
        }
        if count > 0 {
            info!(monitors = count, "all monitors stopped");
        }
    }

    /// Number of armed monitors.
    pub async fn active_monitor_count(&self) -> usize {
        self.monitors.lock().await.len()
    }

    /// Whether the rule currently has an armed monitor.
    pub async fn is_monitoring(&self, rule_id: &RuleId) -> bool {
        self.monitors.lock().await.contains_key(rule_id)
    }

    /// The rule's execution gate. Lock it to serialize with scheduled
    /// ticks; created on first use and kept across arm/stop cycles.
    pub async fn execution_gate(&self, rule_id: &RuleId) -> Arc<Mutex<()>> {
        self.gates
            .lock()
            .await
            .entry(rule_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the rule's gate after deletion. A guard already held keeps
    /// the gate alive through its own `Arc`.
    pub async fn drop_gate(&self, rule_id: &RuleId) {
        self.gates.lock().await.remove(rule_id);
    }
}

/// The per-rule monitoring task.
struct MonitorTask {
    rule_id: RuleId,
    store: Arc<dyn RuleStore>,
    evaluator: Arc<ConditionEvaluator>,
    pipeline: Arc<ExecutionPipeline>,
    clock: Arc<dyn ClockSource>,
    gate: Arc<Mutex<()>>,
    events: Option<tokio::sync::mpsc::Receiver<DomainEvent>>,
    cancel: CancellationToken,
    tick_interval: Duration,
}

impl MonitorTask {
    async fn run(mut self) {
        debug!(rule_id = %self.rule_id, state = %MonitorState::Monitoring, "monitor started");

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first interval tick completes immediately; consume it so the
        // first evaluation lands one full period after arming.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    // Per-rule serialization: skip (not queue) a tick that
                    // would overlap a still-running one or a manual trigger.
                    let Ok(_busy) = self.gate.clone().try_lock_owned() else {
                        debug!(rule_id = %self.rule_id, "previous execution still in flight, tick skipped");
                        continue;
                    };
                    if !self.tick().await {
                        break;
                    }
                }
            }
        }

        debug!(rule_id = %self.rule_id, state = %MonitorState::Stopped, "monitor stopped");
    }

    /// Run one tick. Returns `false` when the monitor should stop.
    ///
    /// Errors inside evaluation or execution never escape: they resolve
    /// to "this tick produced no state change" and never deactivate the
    /// rule.
    async fn tick(&mut self) -> bool {
        // The store is the source of truth: re-read the rule each tick.
        let rule = match self.store.get(&self.rule_id).await {
            Ok(Some(rule)) => rule,
            Ok(None) => {
                info!(rule_id = %self.rule_id, "rule no longer exists, stopping monitor");
                return false;
            }
            Err(error) => {
                warn!(rule_id = %self.rule_id, %error, "rule lookup failed, tick skipped");
                return true;
            }
        };
        if !rule.active {
            info!(rule_id = %self.rule_id, "rule deactivated, stopping monitor");
            return false;
        }

        debug!(rule_id = %self.rule_id, state = %MonitorState::Evaluating, "tick");
        let mut ctx = EvalContext {
            now: self.clock.now(),
            created_at: rule.created_at,
            last_triggered: rule.last_triggered,
            events: self.events.as_mut(),
        };
        let satisfied = self.evaluator.evaluate(&rule.condition, &mut ctx).await;

        if satisfied {
            info!(
                rule_id = %self.rule_id,
                state = %MonitorState::Triggering,
                "condition satisfied, executing"
            );
            let execution = self.pipeline.execute(&rule).await;
            if execution.success {
                info!(
                    rule_id = %self.rule_id,
                    transaction_id = ?execution.transaction_id,
                    "scheduled execution completed"
                );
            } else {
                warn!(
                    rule_id = %self.rule_id,
                    error = ?execution.error,
                    "scheduled execution failed"
                );
            }
        }

        true
    }
}
