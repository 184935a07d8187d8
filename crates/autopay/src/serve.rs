// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `autopay serve` command implementation.
//!
//! Wires the engine to simulated collaborators, seeds a few demo rules,
//! and runs until SIGINT/SIGTERM. Shutdown is graceful: monitors are
//! cancelled between ticks and in-flight executions settle before exit.

use std::sync::Arc;

use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use autopay_config::model::AutopayConfig;
use autopay_core::error::AutopayError;
use autopay_core::SystemClock;
use autopay_engine::{AutopayEngine, LocalEventBus, MemoryLedger, MemoryRuleStore};

use crate::sim::{LogNotifier, SimPriceFeed, SimWallet};

/// Runs the `autopay serve` command.
pub async fn run_serve(config: AutopayConfig) -> Result<(), AutopayError> {
    init_tracing(&config.log.level);

    let clock = Arc::new(SystemClock);
    let store = Arc::new(MemoryRuleStore::new());
    let ledger = Arc::new(MemoryLedger::new(clock.clone()));
    let bus = Arc::new(LocalEventBus::new());
    let wallet = Arc::new(SimWallet::new(dec!(10)));
    let price_feed = Arc::new(SimPriceFeed::new(dec!(50_000)));
    let notifier = Arc::new(LogNotifier);

    let engine = AutopayEngine::new(
        store,
        wallet,
        ledger,
        price_feed,
        bus,
        notifier,
        clock,
        &config.engine,
    );
    engine.initialize().await?;

    seed_demo_rules(&engine).await?;

    let shutdown = install_signal_handler();
    shutdown.cancelled().await;

    info!("shutting down");
    engine.shutdown().await;

    let stats = engine.get_stats().await?;
    info!(
        total = stats.total_rules,
        active = stats.active_rules,
        triggered = stats.triggered_rules,
        "final rule stats"
    );
    Ok(())
}

/// Seed a small demo rule set covering each condition family.
async fn seed_demo_rules(engine: &AutopayEngine) -> Result<(), AutopayError> {
    let demos = [
        ("merchant-coffee", dec!(0.0005), "every 2 minutes"),
        ("payroll-alice", dec!(0.01), "daily at 09:00"),
        ("vault-sweep", dec!(0.002), "price above 51000"),
        ("refund-desk", dec!(0.001), "on event refund_requested"),
    ];
    for (recipient, amount, condition) in demos {
        let rule = engine.create_rule(recipient, amount, condition).await?;
        info!(rule_id = %rule.id, recipient, condition, "demo rule seeded");
    }
    Ok(())
}

/// Installs SIGINT/SIGTERM handlers, returning a token cancelled on the
/// first signal.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(error) => {
                    tracing::error!(%error, "failed to install SIGTERM handler");
                    let _ = ctrl_c.await;
                    token_clone.cancel();
                    return;
                }
            };

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("autopay={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
