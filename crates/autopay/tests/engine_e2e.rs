// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end integration tests for the complete autopay engine.
//!
//! Each test creates an isolated `EngineHarness` with mock collaborators
//! and a manual clock. Tokio's paused clock drives the monitor timers
//! while the manual clock drives condition semantics, so every test is
//! deterministic and runs in milliseconds of real time.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use autopay_core::condition::Predicate;
use autopay_core::error::AutopayError;
use autopay_core::types::{AutopayRule, TransactionStatus, WalletRef};
use autopay_core::LedgerStore;
use autopay_engine::{ExecutionPipeline, MemoryRuleStore, RuleStore};
use autopay_test_utils::{
    EngineHarness, ManualClock, MockLedger, MockNotifier, MockWallet,
};

/// Let armed monitors run `secs` of virtual time.
async fn run_ticks(secs: u64) {
    tokio::time::sleep(StdDuration::from_secs(secs)).await;
}

// ---- Periodic rules ----

#[tokio::test(start_paused = true)]
async fn periodic_rule_executes_once_per_boundary() {
    let h = EngineHarness::builder().with_tick_interval_secs(1).build();
    h.engine.initialize().await.unwrap();

    let rule = h
        .engine
        .create_rule("merchant-coffee", dec!(0.01), "every 120 seconds")
        .await
        .unwrap();

    // Before the first boundary: nothing fires.
    h.clock.advance(Duration::seconds(60));
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 0);

    // Past the first boundary: exactly one execution, driven to completed.
    h.clock.advance(Duration::seconds(61));
    run_ticks(2).await;
    let history = h.ledger.list_for_rule(&rule.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, TransactionStatus::Completed);
    assert!(history[0].settlement_ref.is_some());

    // More ticks inside the same window: no re-fire.
    h.clock.advance(Duration::seconds(30));
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 1);

    // The next boundary fires again.
    h.clock.advance(Duration::seconds(120));
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 2);

    h.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn engine_restart_resumes_schedule_without_refiring() {
    let h = EngineHarness::builder().with_tick_interval_secs(1).build();
    h.engine.initialize().await.unwrap();

    h.engine
        .create_rule("payroll", dec!(0.05), "every 60 seconds")
        .await
        .unwrap();

    h.clock.advance(Duration::seconds(61));
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 1);

    // Simulated restart: monitors torn down, then re-armed from the store.
    h.engine.shutdown().await;
    assert_eq!(h.engine.active_monitors().await, 0);
    h.engine.initialize().await.unwrap();
    assert_eq!(h.engine.active_monitors().await, 1);

    // Same window after restart: the already-satisfied boundary must not
    // re-fire.
    h.clock.advance(Duration::seconds(10));
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 1);

    // Next boundary fires on the original created_at-anchored schedule.
    h.clock.advance(Duration::seconds(60));
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 2);

    h.shutdown().await.unwrap();
}

// ---- Calendar rules ----

#[tokio::test(start_paused = true)]
async fn daily_rule_fires_once_per_day_at_target_time() {
    let h = EngineHarness::builder().with_tick_interval_secs(1).build();
    h.engine.initialize().await.unwrap();

    h.engine
        .create_rule("payroll-alice", dec!(0.1), "daily at 09:00")
        .await
        .unwrap();

    // 08:59 — before the target.
    h.clock.advance(Duration::hours(8) + Duration::minutes(59));
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 0);

    // 09:00:30 — inside today's window.
    h.clock.advance(Duration::seconds(90));
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 1);

    // Later the same day: no re-fire.
    h.clock.advance(Duration::hours(5));
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 1);

    // Next day past 09:00.
    h.clock.advance(Duration::hours(20));
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 2);

    h.shutdown().await.unwrap();
}

// ---- Funds handling ----

#[tokio::test(start_paused = true)]
async fn insufficient_balance_skips_silently_and_retries() {
    let h = EngineHarness::builder()
        .with_tick_interval_secs(1)
        .with_balance(dec!(0))
        .build();
    h.engine.initialize().await.unwrap();

    let rule = h
        .engine
        .create_rule("merchant", dec!(0.5), "every 60 seconds")
        .await
        .unwrap();

    // Boundary passes with an empty wallet: no ledger record at all.
    h.clock.advance(Duration::seconds(61));
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 0);

    // Rule stayed active and untriggered.
    let stored = h.engine.get_rule(&rule.id).await.unwrap().unwrap();
    assert!(stored.active);
    assert!(stored.last_triggered.is_none());

    // Funds arrive: the next tick executes.
    h.wallet.set_balance(dec!(1));
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 1);

    h.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn balance_lookup_outage_skips_tick_and_retries() {
    let h = EngineHarness::builder().with_tick_interval_secs(1).build();
    h.engine.initialize().await.unwrap();

    let rule = h
        .engine
        .create_rule("merchant", dec!(0.01), "every 60 seconds")
        .await
        .unwrap();
    h.wallet.fail_balance_lookups(true);

    // Boundary passes while the gateway is down: nothing commits.
    h.clock.advance(Duration::seconds(61));
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 0);

    // The outage is treated like a short balance for those ticks: the
    // rule stays active and untriggered.
    let stored = h.engine.get_rule(&rule.id).await.unwrap().unwrap();
    assert!(stored.active);
    assert!(stored.last_triggered.is_none());

    // Gateway recovers: the still-pending window executes.
    h.wallet.fail_balance_lookups(false);
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 1);

    h.shutdown().await.unwrap();
}

// ---- Ledger faults ----

fn pipeline_with_faulty_ledger() -> (ExecutionPipeline, Arc<MemoryRuleStore>, Arc<MockLedger>) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    ));
    let store = Arc::new(MemoryRuleStore::new());
    let ledger = Arc::new(MockLedger::new(clock.clone()));
    let pipeline = ExecutionPipeline::new(
        Arc::new(MockWallet::new(dec!(1))),
        ledger.clone(),
        store.clone(),
        clock,
        Arc::new(MockNotifier::new()),
        WalletRef("primary".into()),
        StdDuration::from_millis(10),
    );
    (pipeline, store, ledger)
}

fn payment_rule() -> AutopayRule {
    AutopayRule::new(
        WalletRef("merchant".into()),
        dec!(0.01),
        Predicate::Periodic { interval_secs: 60 },
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    )
}

#[tokio::test(start_paused = true)]
async fn settlement_failure_marks_transaction_failed() {
    let (pipeline, store, ledger) = pipeline_with_faulty_ledger();
    let rule = payment_rule();
    store.insert(rule.clone()).await.unwrap();

    ledger.fail_next_updates(1);
    let execution = pipeline.execute(&rule).await;

    assert!(!execution.success);
    assert_eq!(execution.error.as_deref(), Some("settlement failed"));

    // The committed record reaches a terminal status, never stuck pending.
    let tx_id = execution.transaction_id.expect("committed transaction id");
    let record = ledger.get(&tx_id).await.unwrap().unwrap();
    assert_eq!(record.status, TransactionStatus::Failed);

    // A failed settlement does not consume the rule's window.
    let stored = store.get(&rule.id).await.unwrap().unwrap();
    assert!(stored.last_triggered.is_none());
}

#[tokio::test(start_paused = true)]
async fn ledger_outage_at_commit_leaves_no_record() {
    let (pipeline, store, ledger) = pipeline_with_faulty_ledger();
    let rule = payment_rule();
    store.insert(rule.clone()).await.unwrap();

    ledger.fail_next_creates(1);
    let execution = pipeline.execute(&rule).await;

    assert!(!execution.success);
    assert_eq!(execution.error.as_deref(), Some("ledger unavailable"));
    assert!(execution.transaction_id.is_none());
    assert_eq!(ledger.record_count().await, 0);

    // Ledger recovers: the next attempt commits and settles.
    let execution = pipeline.execute(&rule).await;
    assert!(execution.success);
    assert_eq!(ledger.record_count().await, 1);
}

// ---- Deactivation and in-flight executions ----

#[tokio::test(start_paused = true)]
async fn deactivation_mid_flight_lets_execution_settle() {
    let h = EngineHarness::builder()
        .with_tick_interval_secs(1)
        .with_settlement_delay_ms(5_000)
        .build();
    h.engine.initialize().await.unwrap();

    let rule = h
        .engine
        .create_rule("vault", dec!(0.2), "every 60 seconds")
        .await
        .unwrap();

    h.clock.advance(Duration::seconds(61));
    // Tick fires at +1s virtual; settlement holds the record pending.
    tokio::time::sleep(StdDuration::from_millis(1_500)).await;
    let history = h.ledger.list_for_rule(&rule.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, TransactionStatus::Pending);

    // Deactivate while settlement is in flight.
    assert!(h.engine.deactivate_rule(&rule.id).await.unwrap());
    assert!(!h.engine.is_monitoring(&rule.id).await);

    // The committed execution still reaches a terminal status.
    run_ticks(10).await;
    let history = h.ledger.list_for_rule(&rule.id).await.unwrap();
    assert_eq!(history[0].status, TransactionStatus::Completed);

    // No further executions after deactivation.
    h.clock.advance(Duration::seconds(600));
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 1);
    assert_eq!(h.engine.active_monitors().await, 0);

    h.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn reactivation_rearms_monitoring() {
    let h = EngineHarness::builder().with_tick_interval_secs(1).build();
    h.engine.initialize().await.unwrap();

    let rule = h
        .engine
        .create_rule("merchant", dec!(0.01), "every 60 seconds")
        .await
        .unwrap();
    assert!(h.engine.deactivate_rule(&rule.id).await.unwrap());
    assert!(!h.engine.is_monitoring(&rule.id).await);

    h.clock.advance(Duration::seconds(61));
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 0);

    assert!(h.engine.activate_rule(&rule.id).await.unwrap());
    assert!(h.engine.is_monitoring(&rule.id).await);
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 1);

    // Activating an already-active rule replaces the monitor rather than
    // doubling it.
    assert!(h.engine.activate_rule(&rule.id).await.unwrap());
    assert!(h.engine.activate_rule(&rule.id).await.unwrap());
    assert_eq!(h.engine.active_monitors().await, 1);
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 1);

    h.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn manual_trigger_on_inactive_rule_fails_without_side_effects() {
    let h = EngineHarness::builder().with_tick_interval_secs(1).build();
    h.engine.initialize().await.unwrap();

    let rule = h
        .engine
        .create_rule("merchant", dec!(0.01), "every 60 seconds")
        .await
        .unwrap();
    h.engine.deactivate_rule(&rule.id).await.unwrap();

    let execution = h.engine.manually_trigger_rule(&rule.id).await.unwrap();
    assert!(!execution.success);
    assert_eq!(execution.error.as_deref(), Some("rule inactive"));
    assert_eq!(h.ledger.record_count().await, 0);
    assert!(h
        .engine
        .get_rule(&rule.id)
        .await
        .unwrap()
        .unwrap()
        .last_triggered
        .is_none());
}

// ---- Event rules ----

#[tokio::test(start_paused = true)]
async fn event_rule_executes_once_per_occurrence() {
    let h = EngineHarness::builder().with_tick_interval_secs(1).build();
    h.engine.initialize().await.unwrap();

    let rule = h
        .engine
        .create_rule("refund-desk", dec!(0.02), "on event refund_requested")
        .await
        .unwrap();

    // No event yet: ticks pass without executions.
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 0);

    // Two occurrences queue up; each produces exactly one execution,
    // drained one per tick.
    h.publish_event("refund_requested", serde_json::json!({"order": 1}))
        .await;
    h.publish_event("refund_requested", serde_json::json!({"order": 2}))
        .await;
    run_ticks(4).await;
    assert_eq!(h.ledger.list_for_rule(&rule.id).await.unwrap().len(), 2);

    // Queue drained: no further executions.
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 2);

    // Unmatched event types are ignored.
    h.publish_event("deposit_received", serde_json::json!({})).await;
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 2);

    h.shutdown().await.unwrap();
}

// ---- Price rules ----

#[tokio::test(start_paused = true)]
async fn price_rule_follows_feed_and_fails_closed_on_outage() {
    let h = EngineHarness::builder()
        .with_tick_interval_secs(1)
        .with_price(dec!(50_000))
        .build();
    h.engine.initialize().await.unwrap();

    let rule = h
        .engine
        .create_rule("sweep", dec!(0.03), "price above 51000")
        .await
        .unwrap();

    // Below threshold: nothing fires.
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 0);

    // Feed outage: fail-closed, rule stays active.
    h.price.set_price(None);
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 0);
    assert!(h.engine.get_rule(&rule.id).await.unwrap().unwrap().active);

    // Price crosses the threshold: the next tick executes.
    h.price.set_price(Some(dec!(52_000)));
    run_ticks(2).await;
    assert!(h.ledger.record_count().await >= 1);

    h.shutdown().await.unwrap();
}

// ---- Manual triggers ----

#[tokio::test(start_paused = true)]
async fn manual_trigger_executes_and_suppresses_current_window() {
    let h = EngineHarness::builder().with_tick_interval_secs(1).build();
    h.engine.initialize().await.unwrap();

    let rule = h
        .engine
        .create_rule("merchant", dec!(0.01), "every 100 seconds")
        .await
        .unwrap();

    // Inside the second window, before its boundary tick has fired.
    h.clock.advance(Duration::seconds(150));
    let execution = h.engine.manually_trigger_rule(&rule.id).await.unwrap();
    assert!(execution.success);
    assert_eq!(h.ledger.record_count().await, 1);

    // Scheduled ticks in the same window are suppressed by the manual
    // trigger's last_triggered.
    run_ticks(3).await;
    assert_eq!(h.ledger.record_count().await, 1);

    // The following window fires normally.
    h.clock.advance(Duration::seconds(100));
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 2);

    h.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn concurrent_manual_triggers_serialize_per_rule() {
    let h = EngineHarness::builder()
        .with_tick_interval_secs(1_000)
        .with_settlement_delay_ms(2_000)
        .build();
    h.engine.initialize().await.unwrap();

    let rule = h
        .engine
        .create_rule("merchant", dec!(0.01), "every 100 seconds")
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        h.engine.manually_trigger_rule(&rule.id),
        h.engine.manually_trigger_rule(&rule.id),
    );
    assert!(a.unwrap().success);
    assert!(b.unwrap().success);

    // Both ran, one after the other, and both settled.
    let history = h.ledger.list_for_rule(&rule.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history
        .iter()
        .all(|r| r.status == TransactionStatus::Completed));

    h.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn manual_trigger_on_unknown_rule_is_not_found() {
    let h = EngineHarness::new();
    h.engine.initialize().await.unwrap();

    let missing = autopay_core::types::RuleId::generate();
    let err = h.engine.manually_trigger_rule(&missing).await.unwrap_err();
    assert!(matches!(err, AutopayError::RuleNotFound(_)));
}

// ---- Rule lifecycle ----

#[tokio::test(start_paused = true)]
async fn create_rule_rejects_invalid_input() {
    let h = EngineHarness::new();
    h.engine.initialize().await.unwrap();

    let err = h
        .engine
        .create_rule("  ", dec!(0.01), "every 60 seconds")
        .await
        .unwrap_err();
    assert!(matches!(err, AutopayError::Validation(_)));

    let err = h
        .engine
        .create_rule("merchant", dec!(0), "every 60 seconds")
        .await
        .unwrap_err();
    assert!(matches!(err, AutopayError::Validation(_)));

    let err = h
        .engine
        .create_rule("merchant", dec!(0.01), "whenever I feel like it")
        .await
        .unwrap_err();
    assert!(matches!(err, AutopayError::Parse(_)));

    // Nothing was stored or armed.
    assert_eq!(h.engine.list_rules().await.unwrap().len(), 0);
    assert_eq!(h.engine.active_monitors().await, 0);
}

#[tokio::test(start_paused = true)]
async fn delete_rule_stops_monitoring_but_keeps_history() {
    let h = EngineHarness::builder().with_tick_interval_secs(1).build();
    h.engine.initialize().await.unwrap();

    let rule = h
        .engine
        .create_rule("merchant", dec!(0.01), "every 60 seconds")
        .await
        .unwrap();

    h.clock.advance(Duration::seconds(61));
    run_ticks(2).await;
    assert_eq!(h.ledger.record_count().await, 1);

    assert!(h.engine.delete_rule(&rule.id).await.unwrap());
    assert!(!h.engine.is_monitoring(&rule.id).await);
    assert_eq!(h.engine.active_monitors().await, 0);
    assert!(h.engine.get_rule(&rule.id).await.unwrap().is_none());
    assert!(!h.engine.delete_rule(&rule.id).await.unwrap());

    // No further executions, but the ledger history survives.
    h.clock.advance(Duration::seconds(600));
    run_ticks(3).await;
    assert_eq!(h.ledger.list_for_rule(&rule.id).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stats_track_rule_counters() {
    let h = EngineHarness::builder().with_tick_interval_secs(1).build();
    h.engine.initialize().await.unwrap();

    let triggered = h
        .engine
        .create_rule("merchant-a", dec!(0.01), "every 60 seconds")
        .await
        .unwrap();
    let dormant = h
        .engine
        .create_rule("merchant-b", dec!(0.01), "daily at 23:59")
        .await
        .unwrap();
    h.engine.deactivate_rule(&dormant.id).await.unwrap();

    h.clock.advance(Duration::seconds(61));
    run_ticks(2).await;

    let stats = h.engine.get_stats().await.unwrap();
    assert_eq!(stats.total_rules, 2);
    assert_eq!(stats.active_rules, 1);
    assert_eq!(stats.triggered_rules, 1);

    // Notification went out for the executed rule, and only that one.
    let notices = h.notifier.notices().await;
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].rule_id, triggered.id);
    assert!(notices[0].success);

    h.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn notification_failure_does_not_affect_execution() {
    let h = EngineHarness::builder().with_tick_interval_secs(1).build();
    h.engine.initialize().await.unwrap();
    h.notifier.fail_deliveries(true).await;

    let rule = h
        .engine
        .create_rule("merchant", dec!(0.01), "every 60 seconds")
        .await
        .unwrap();

    h.clock.advance(Duration::seconds(61));
    run_ticks(2).await;

    let history = h.ledger.list_for_rule(&rule.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, TransactionStatus::Completed);
    assert!(h
        .engine
        .get_rule(&rule.id)
        .await
        .unwrap()
        .unwrap()
        .last_triggered
        .is_some());

    // Refused deliveries leave no recorded notices behind.
    assert_eq!(h.notifier.notice_count().await, 0);

    h.shutdown().await.unwrap();
}
