// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine testing.
//!
//! `EngineHarness` assembles a full engine with mock collaborators, a
//! manual clock, and the shipped in-memory backends, and keeps handles to
//! all of them so tests can steer balances, prices, events, and time.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use autopay_config::model::EngineConfig;
use autopay_core::error::AutopayError;
use autopay_core::types::DomainEvent;
use autopay_core::ClockSource;
use autopay_engine::{AutopayEngine, LocalEventBus, MemoryLedger, MemoryRuleStore};

use crate::manual_clock::ManualClock;
use crate::mock_notifier::MockNotifier;
use crate::mock_price::MockPriceFeed;
use crate::mock_wallet::MockWallet;

/// Builder for [`EngineHarness`].
pub struct EngineHarnessBuilder {
    balance: Decimal,
    price: Decimal,
    tick_interval_secs: u64,
    settlement_delay_ms: u64,
    start: DateTime<Utc>,
}

impl EngineHarnessBuilder {
    fn new() -> Self {
        Self {
            balance: dec!(1),
            price: dec!(50_000),
            tick_interval_secs: 60,
            settlement_delay_ms: 10,
            start: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    /// Starting balance of the funding wallet.
    pub fn with_balance(mut self, balance: Decimal) -> Self {
        self.balance = balance;
        self
    }

    /// Starting quote served by the price feed.
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    /// Monitor tick period in seconds.
    pub fn with_tick_interval_secs(mut self, secs: u64) -> Self {
        self.tick_interval_secs = secs;
        self
    }

    /// Simulated settlement delay in milliseconds.
    pub fn with_settlement_delay_ms(mut self, ms: u64) -> Self {
        self.settlement_delay_ms = ms;
        self
    }

    /// Instant the manual clock starts at.
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    pub fn build(self) -> EngineHarness {
        let clock = Arc::new(ManualClock::new(self.start));
        let wallet = Arc::new(MockWallet::new(self.balance));
        let price = Arc::new(MockPriceFeed::new(self.price));
        let notifier = Arc::new(MockNotifier::new());
        let bus = Arc::new(LocalEventBus::new());
        let store = Arc::new(MemoryRuleStore::new());
        let ledger = Arc::new(MemoryLedger::new(clock.clone()));

        let config = EngineConfig {
            tick_interval_secs: self.tick_interval_secs,
            settlement_delay_ms: self.settlement_delay_ms,
            price_symbol: "BTC-USD".to_string(),
            funding_wallet: "primary".to_string(),
        };

        let engine = AutopayEngine::new(
            store.clone(),
            wallet.clone(),
            ledger.clone(),
            price.clone(),
            bus.clone(),
            notifier.clone(),
            clock.clone(),
            &config,
        );

        EngineHarness {
            engine,
            clock,
            wallet,
            price,
            notifier,
            bus,
            store,
            ledger,
        }
    }
}

/// A fully wired engine plus handles to every mock around it.
pub struct EngineHarness {
    pub engine: AutopayEngine,
    pub clock: Arc<ManualClock>,
    pub wallet: Arc<MockWallet>,
    pub price: Arc<MockPriceFeed>,
    pub notifier: Arc<MockNotifier>,
    pub bus: Arc<LocalEventBus>,
    pub store: Arc<MemoryRuleStore>,
    pub ledger: Arc<MemoryLedger>,
}

impl EngineHarness {
    pub fn builder() -> EngineHarnessBuilder {
        EngineHarnessBuilder::new()
    }

    /// Harness with all defaults: funded wallet, 60 s ticks, short
    /// settlement, clock at 2026-01-01T00:00:00Z.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Publish a domain event stamped with the manual clock.
    pub async fn publish_event(&self, event_type: &str, payload: serde_json::Value) {
        self.bus
            .publish(DomainEvent {
                event_type: event_type.to_string(),
                payload,
                occurred_at: self.clock.now(),
            })
            .await;
    }

    /// Shut the engine down, cancelling all monitors.
    pub async fn shutdown(&self) -> Result<(), AutopayError> {
        self.engine.shutdown().await;
        Ok(())
    }
}

impl Default for EngineHarness {
    fn default() -> Self {
        Self::new()
    }
}
