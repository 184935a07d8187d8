// SPDX-FileCopyrightText: 2026 Autopay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the autopay engine.
//!
//! The engine consumes these seams but does not implement the real
//! backends: wallets, ledgers, price feeds, and event delivery are owned
//! by the surrounding application. All traits use `#[async_trait]` for
//! dynamic dispatch compatibility, except [`ClockSource`], which is a
//! plain synchronous read.

pub mod clock;
pub mod events;
pub mod ledger;
pub mod notify;
pub mod price;
pub mod wallet;

pub use clock::{ClockSource, SystemClock};
pub use events::EventBus;
pub use ledger::LedgerStore;
pub use notify::NotificationSink;
pub use price::PriceFeed;
pub use wallet::WalletGateway;
